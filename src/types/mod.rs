//! Typed views over GitHub REST documents.
//!
//! The REST core returns `serde_json::Value`; these views are decoded from it
//! by the endpoint services. Only fields stable across GitHub.com and
//! Enterprise Server are required, everything else defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// GitHub user (minimal representation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: u64,
    /// Username (login).
    pub login: String,
    /// Avatar URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Account type (User, Organization, Bot).
    #[serde(rename = "type", default)]
    pub user_type: Option<String>,
    /// Site admin flag.
    #[serde(default)]
    pub site_admin: bool,
    /// Profile URL.
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Full user profile returned by `/user` and `/users/{login}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Summary fields.
    #[serde(flatten)]
    pub user: User,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Company.
    #[serde(default)]
    pub company: Option<String>,
    /// Location.
    #[serde(default)]
    pub location: Option<String>,
    /// Public email.
    #[serde(default)]
    pub email: Option<String>,
    /// Biography.
    #[serde(default)]
    pub bio: Option<String>,
    /// Public repository count.
    #[serde(default)]
    pub public_repos: u32,
    /// Follower count.
    #[serde(default)]
    pub followers: u32,
    /// Following count.
    #[serde(default)]
    pub following: u32,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// GitHub repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository ID.
    pub id: u64,
    /// Repository name.
    pub name: String,
    /// Full name (owner/repo).
    pub full_name: String,
    /// Owner information.
    pub owner: User,
    /// Whether the repository is private.
    #[serde(default)]
    pub private: bool,
    /// Repository description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the repository is a fork.
    #[serde(default)]
    pub fork: bool,
    /// HTML URL.
    #[serde(default)]
    pub html_url: Option<String>,
    /// Clone URL.
    #[serde(default)]
    pub clone_url: Option<String>,
    /// Default branch.
    #[serde(default)]
    pub default_branch: Option<String>,
    /// Primary language.
    #[serde(default)]
    pub language: Option<String>,
    /// Stargazer count.
    #[serde(default)]
    pub stargazers_count: u32,
    /// Open issue count.
    #[serde(default)]
    pub open_issues_count: u32,
    /// Topics.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Whether archived.
    #[serde(default)]
    pub archived: bool,
    /// Visibility (public, private, internal).
    #[serde(default)]
    pub visibility: Option<String>,
    /// Last push timestamp.
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
}

/// GitHub issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue ID.
    pub id: u64,
    /// Issue number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Body.
    #[serde(default)]
    pub body: Option<String>,
    /// State.
    pub state: IssueState,
    /// Author.
    #[serde(default)]
    pub user: Option<User>,
    /// Labels.
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Assignees.
    #[serde(default)]
    pub assignees: Vec<User>,
    /// Milestone.
    #[serde(default)]
    pub milestone: Option<Milestone>,
    /// Comment count.
    #[serde(default)]
    pub comments: u32,
    /// Whether locked.
    #[serde(default)]
    pub locked: bool,
    /// Present when the issue is a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
    /// HTML URL.
    #[serde(default)]
    pub html_url: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Close timestamp.
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// Returns true if this issue is a pull request.
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Issue state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    /// Open.
    Open,
    /// Closed.
    Closed,
}

/// Issue or pull request label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    /// Label ID.
    #[serde(default)]
    pub id: u64,
    /// Name.
    pub name: String,
    /// Color as six hex digits, no leading `#`.
    #[serde(default)]
    pub color: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether this is a default label.
    #[serde(default)]
    pub default: bool,
}

/// Milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    /// Milestone ID.
    pub id: u64,
    /// Milestone number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// State (open, closed).
    #[serde(default)]
    pub state: Option<String>,
    /// Due date.
    #[serde(default)]
    pub due_on: Option<DateTime<Utc>>,
}

/// Issue or pull request comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment ID.
    pub id: u64,
    /// Body.
    pub body: String,
    /// Author.
    #[serde(default)]
    pub user: Option<User>,
    /// HTML URL.
    #[serde(default)]
    pub html_url: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Update timestamp.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// GitHub pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR ID.
    pub id: u64,
    /// PR number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Body.
    #[serde(default)]
    pub body: Option<String>,
    /// State.
    pub state: PullRequestState,
    /// Author.
    #[serde(default)]
    pub user: Option<User>,
    /// Head branch.
    pub head: PullRequestRef,
    /// Base branch.
    pub base: PullRequestRef,
    /// Whether a draft.
    #[serde(default)]
    pub draft: bool,
    /// Whether merged (only on the single-PR endpoint).
    #[serde(default)]
    pub merged: Option<bool>,
    /// Merge timestamp.
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    /// HTML URL.
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Pull request state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
    /// Open.
    Open,
    /// Closed.
    Closed,
}

/// Pull request branch reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestRef {
    /// Label (owner:branch).
    #[serde(default)]
    pub label: Option<String>,
    /// Branch name.
    #[serde(rename = "ref")]
    pub ref_name: String,
    /// Commit SHA.
    pub sha: String,
}

/// A file changed by a pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestFile {
    /// Blob SHA.
    #[serde(default)]
    pub sha: Option<String>,
    /// Path.
    pub filename: String,
    /// Change type (added, removed, modified, renamed, ...).
    pub status: String,
    /// Lines added.
    #[serde(default)]
    pub additions: u32,
    /// Lines removed.
    #[serde(default)]
    pub deletions: u32,
    /// Total changed lines.
    #[serde(default)]
    pub changes: u32,
    /// Previous path, for renames.
    #[serde(default)]
    pub previous_filename: Option<String>,
}

/// GitHub organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization ID.
    pub id: u64,
    /// Login.
    pub login: String,
    /// Display name (full view only).
    #[serde(default)]
    pub name: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// HTML URL (full view only).
    #[serde(default)]
    pub html_url: Option<String>,
    /// Public repository count (full view only).
    #[serde(default)]
    pub public_repos: Option<u32>,
}

/// GitHub team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Team ID.
    pub id: u64,
    /// Name.
    pub name: String,
    /// Slug.
    pub slug: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Privacy.
    #[serde(default)]
    pub privacy: Option<TeamPrivacy>,
    /// Default permission granted on repositories.
    #[serde(default)]
    pub permission: Option<String>,
    /// Parent team.
    #[serde(default)]
    pub parent: Option<Box<Team>>,
    /// Member count (full view only).
    #[serde(default)]
    pub members_count: Option<u32>,
}

/// Team privacy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TeamPrivacy {
    /// Visible to organization members.
    Closed,
    /// Visible only to team members.
    Secret,
}

/// Counters for one rate-limit resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitResource {
    /// Requests allowed per window.
    pub limit: u32,
    /// Requests used in the current window.
    #[serde(default)]
    pub used: u32,
    /// Requests remaining in the current window.
    pub remaining: u32,
    /// Window reset as a Unix timestamp.
    pub reset: i64,
}

impl RateLimitResource {
    /// Window reset as a timestamp.
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.reset, 0)
    }
}

/// Response of `GET /rate_limit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    /// Per-resource counters (core, search, graphql, ...).
    pub resources: std::collections::BTreeMap<String, RateLimitResource>,
    /// Core counters, duplicated at top level by the API.
    pub rate: RateLimitResource,
}

impl RateLimitStatus {
    /// Counters for the `core` resource.
    pub fn core(&self) -> &RateLimitResource {
        self.resources.get("core").unwrap_or(&self.rate)
    }

    /// Counters for the `search` resource, if reported.
    pub fn search(&self) -> Option<&RateLimitResource> {
        self.resources.get("search")
    }
}
