//! Repository operations.

use super::SortDirection;
use crate::client::GitHubClient;
use crate::errors::GitHubResult;
use crate::request::RequestDescriptor;
use crate::types::Repository;
use serde::Serialize;

/// Preview media type that adds `topics` on older Enterprise Server releases.
pub const TOPICS_PREVIEW_ACCEPT: &str = "application/vnd.github.mercy-preview+json";

/// Service for repository operations.
pub struct RepositoriesService<'a> {
    client: &'a GitHubClient,
}

impl<'a> RepositoriesService<'a> {
    /// Creates a new repositories service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Lists public repositories for a user, all pages.
    pub async fn list_for_user(
        &self,
        username: &str,
        params: &ListReposParams,
    ) -> GitHubResult<Vec<Repository>> {
        let request = RequestDescriptor::get(format!("/users/{}/repos", username))
            .query(params)?
            .accept(TOPICS_PREVIEW_ACCEPT)
            .description(format!("Getting repositories for {}", username))
            .telemetry_event("repositories.list_for_user");
        self.client.request_all(request).await
    }

    /// Lists repositories for an organization, all pages.
    pub async fn list_for_org(
        &self,
        org: &str,
        params: &ListReposParams,
    ) -> GitHubResult<Vec<Repository>> {
        let request = RequestDescriptor::get(format!("/orgs/{}/repos", org))
            .query(params)?
            .accept(TOPICS_PREVIEW_ACCEPT)
            .description(format!("Getting repositories for organization {}", org))
            .telemetry_event("repositories.list_for_org");
        self.client.request_all(request).await
    }

    /// Lists repositories the authenticated user can access, all pages.
    pub async fn list_for_authenticated_user(
        &self,
        params: &ListReposParams,
    ) -> GitHubResult<Vec<Repository>> {
        let request = RequestDescriptor::get("/user/repos")
            .query(params)?
            .accept(TOPICS_PREVIEW_ACCEPT)
            .description("Getting repositories for the authenticated user")
            .telemetry_event("repositories.list_for_authenticated_user");
        self.client.request_all(request).await
    }

    /// Gets a repository.
    pub async fn get(&self, owner: &str, repo: &str) -> GitHubResult<Repository> {
        let request = RequestDescriptor::get(format!("/repos/{}/{}", owner, repo))
            .accept(TOPICS_PREVIEW_ACCEPT)
            .description(format!("Getting repository {}/{}", owner, repo))
            .telemetry_event("repositories.get");
        self.client.request(request).await
    }

    /// Creates a repository for the authenticated user.
    pub async fn create(&self, request: &CreateRepoRequest) -> GitHubResult<Repository> {
        let descriptor = RequestDescriptor::post("/user/repos")
            .json(request)?
            .description(format!("Creating repository {}", request.name))
            .telemetry_event("repositories.create");
        self.client.request(descriptor).await
    }

    /// Creates a repository in an organization.
    pub async fn create_for_org(
        &self,
        org: &str,
        request: &CreateRepoRequest,
    ) -> GitHubResult<Repository> {
        let descriptor = RequestDescriptor::post(format!("/orgs/{}/repos", org))
            .json(request)?
            .description(format!("Creating repository {}/{}", org, request.name))
            .telemetry_event("repositories.create_for_org");
        self.client.request(descriptor).await
    }

    /// Deletes a repository.
    pub async fn delete(&self, owner: &str, repo: &str) -> GitHubResult<()> {
        let request = RequestDescriptor::delete(format!("/repos/{}/{}", owner, repo))
            .description(format!("Deleting repository {}/{}", owner, repo))
            .telemetry_event("repositories.delete");
        self.client.request_no_response(request).await
    }
}

/// Parameters for listing repositories.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListReposParams {
    /// Type filter.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub repo_type: Option<RepoType>,
    /// Visibility filter (authenticated user only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<RepoVisibility>,
    /// Sort field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<RepoSort>,
    /// Sort direction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<SortDirection>,
    /// Items per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

/// Repository type filter.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoType {
    /// Every type.
    All,
    /// Owned.
    Owner,
    /// Public.
    Public,
    /// Private.
    Private,
    /// Member of.
    Member,
    /// Forks (organizations only).
    Forks,
    /// Sources (organizations only).
    Sources,
}

/// Repository visibility filter.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoVisibility {
    /// Every visibility.
    All,
    /// Public.
    Public,
    /// Private.
    Private,
}

/// Repository sort field.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoSort {
    /// Creation time.
    Created,
    /// Last update.
    Updated,
    /// Last push.
    Pushed,
    /// Full name.
    FullName,
}

/// Request to create a repository.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateRepoRequest {
    /// Repository name.
    pub name: String,
    /// Repository description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Homepage URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// Whether the repository is private.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    /// Whether issues are enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_issues: Option<bool>,
    /// Whether wiki is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_wiki: Option<bool>,
    /// Auto-initialize with README.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_init: Option<bool>,
    /// Gitignore template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gitignore_template: Option<String>,
    /// License template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_template: Option<String>,
}

impl CreateRepoRequest {
    /// Creates a request with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
