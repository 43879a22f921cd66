//! Issue operations.

use super::SortDirection;
use crate::client::GitHubClient;
use crate::errors::GitHubResult;
use crate::request::RequestDescriptor;
use crate::types::{Comment, Issue, IssueState};
use serde::Serialize;

/// Service for issue operations.
pub struct IssuesService<'a> {
    client: &'a GitHubClient,
}

impl<'a> IssuesService<'a> {
    /// Creates a new issues service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Lists issues in a repository, all pages.
    pub async fn list(&self, owner: &str, repo: &str) -> GitHubResult<Vec<Issue>> {
        self.list_with_params(owner, repo, &ListIssuesParams::default())
            .await
    }

    /// Lists issues with parameters, all pages.
    pub async fn list_with_params(
        &self,
        owner: &str,
        repo: &str,
        params: &ListIssuesParams,
    ) -> GitHubResult<Vec<Issue>> {
        let request = RequestDescriptor::get(format!("/repos/{}/{}/issues", owner, repo))
            .query(params)?
            .description(format!("Getting issues for {}/{}", owner, repo))
            .telemetry_event("issues.list");
        self.client.request_all(request).await
    }

    /// Gets an issue.
    pub async fn get(&self, owner: &str, repo: &str, issue_number: u64) -> GitHubResult<Issue> {
        let request = RequestDescriptor::get(format!(
            "/repos/{}/{}/issues/{}",
            owner, repo, issue_number
        ))
        .description(format!("Getting issue #{} for {}/{}", issue_number, owner, repo))
        .telemetry_event("issues.get");
        self.client.request(request).await
    }

    /// Creates an issue.
    pub async fn create(
        &self,
        owner: &str,
        repo: &str,
        request: &CreateIssueRequest,
    ) -> GitHubResult<Issue> {
        let request = RequestDescriptor::post(format!("/repos/{}/{}/issues", owner, repo))
            .json(request)?
            .description(format!("Creating issue \"{}\" in {}/{}", request.title, owner, repo))
            .telemetry_event("issues.create");
        self.client.request(request).await
    }

    /// Updates an issue.
    pub async fn update(
        &self,
        owner: &str,
        repo: &str,
        issue_number: u64,
        request: &UpdateIssueRequest,
    ) -> GitHubResult<Issue> {
        let request = RequestDescriptor::patch(format!(
            "/repos/{}/{}/issues/{}",
            owner, repo, issue_number
        ))
        .json(request)?
        .description(format!("Updating issue #{} in {}/{}", issue_number, owner, repo))
        .telemetry_event("issues.update");
        self.client.request(request).await
    }

    /// Lists comments on an issue, all pages.
    pub async fn list_comments(
        &self,
        owner: &str,
        repo: &str,
        issue_number: u64,
    ) -> GitHubResult<Vec<Comment>> {
        let request = RequestDescriptor::get(format!(
            "/repos/{}/{}/issues/{}/comments",
            owner, repo, issue_number
        ))
        .description(format!(
            "Getting comments for issue #{} in {}/{}",
            issue_number, owner, repo
        ))
        .telemetry_event("issues.comments.list");
        self.client.request_all(request).await
    }

    /// Adds a comment to an issue.
    pub async fn create_comment(
        &self,
        owner: &str,
        repo: &str,
        issue_number: u64,
        body: &str,
    ) -> GitHubResult<Comment> {
        let payload = CreateCommentRequest {
            body: body.to_string(),
        };
        let request = RequestDescriptor::post(format!(
            "/repos/{}/{}/issues/{}/comments",
            owner, repo, issue_number
        ))
        .json(&payload)?
        .description(format!(
            "Commenting on issue #{} in {}/{}",
            issue_number, owner, repo
        ))
        .telemetry_event("issues.comments.create");
        self.client.request(request).await
    }
}

/// Parameters for listing issues.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListIssuesParams {
    /// Filter by milestone number, `*` or `none`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
    /// Filter by state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueStateFilter>,
    /// Filter by assignee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// Filter by creator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    /// Filter by mentioned user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentioned: Option<String>,
    /// Filter by labels (comma-separated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
    /// Sort field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<IssueSort>,
    /// Sort direction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<SortDirection>,
    /// Only issues updated at or after this ISO 8601 time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    /// Items per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

/// Issue state filter.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStateFilter {
    /// Open issues.
    Open,
    /// Closed issues.
    Closed,
    /// Both.
    All,
}

/// Issue sort field.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSort {
    /// Creation time.
    Created,
    /// Last update.
    Updated,
    /// Comment count.
    Comments,
}

/// Request to create an issue.
#[derive(Debug, Clone, Serialize)]
pub struct CreateIssueRequest {
    /// Issue title.
    pub title: String,
    /// Issue body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Assignees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    /// Milestone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
    /// Labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl CreateIssueRequest {
    /// Creates a request with just a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
            assignees: None,
            milestone: None,
            labels: None,
        }
    }
}

/// Request to update an issue.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateIssueRequest {
    /// Issue title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Issue body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Issue state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueState>,
    /// State reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_reason: Option<StateReason>,
    /// Assignees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    /// Milestone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
    /// Labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

/// State reason for closing an issue.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateReason {
    /// Done.
    Completed,
    /// Won't do.
    NotPlanned,
    /// Reopened.
    Reopened,
}

#[derive(Debug, Clone, Serialize)]
struct CreateCommentRequest {
    body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::mock_client;
    use crate::mocks::MockResponse;
    use serde_json::{json, Value};

    fn issue(number: u64) -> Value {
        json!({"id": number, "number": number, "title": format!("Issue {}", number), "state": "open"})
    }

    #[tokio::test]
    async fn test_list_with_params() {
        let (client, transport) = mock_client();
        transport.on_get(
            "https://api.test/repos/o/r/issues?state=all&labels=bug",
            MockResponse::ok(&json!([issue(1), issue(2)]))
                .with_next("https://api.test/repos/o/r/issues?state=all&labels=bug&page=2"),
        );
        transport.on_get(
            "https://api.test/repos/o/r/issues?state=all&labels=bug&page=2",
            MockResponse::ok(&json!([issue(3)])),
        );

        let params = ListIssuesParams {
            state: Some(IssueStateFilter::All),
            labels: Some("bug".to_string()),
            ..Default::default()
        };
        let issues = client.issues().list_with_params("o", "r", &params).await.unwrap();

        let numbers: Vec<u64> = issues.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_create_and_update() {
        let (client, transport) = mock_client();
        transport.on_post("https://api.test/repos/o/r/issues", MockResponse::created(&issue(5)));
        transport.on_patch(
            "https://api.test/repos/o/r/issues/5",
            MockResponse::ok(&json!({"id": 5, "number": 5, "title": "Issue 5", "state": "closed"})),
        );

        let created = client
            .issues()
            .create("o", "r", &CreateIssueRequest::new("Issue 5"))
            .await
            .unwrap();
        assert_eq!(created.number, 5);

        let update = UpdateIssueRequest {
            state: Some(IssueState::Closed),
            state_reason: Some(StateReason::Completed),
            ..Default::default()
        };
        let updated = client.issues().update("o", "r", 5, &update).await.unwrap();
        assert_eq!(updated.state, IssueState::Closed);

        let sent = transport.requests();
        let body: Value = serde_json::from_str(sent[1].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"state": "closed", "state_reason": "completed"}));
    }

    #[tokio::test]
    async fn test_comments() {
        let (client, transport) = mock_client();
        transport.on_get(
            "https://api.test/repos/o/r/issues/5/comments",
            MockResponse::ok(&json!([{"id": 10, "body": "first"}])),
        );
        transport.on_post(
            "https://api.test/repos/o/r/issues/5/comments",
            MockResponse::created(&json!({"id": 11, "body": "second"})),
        );

        let comments = client.issues().list_comments("o", "r", 5).await.unwrap();
        assert_eq!(comments[0].body, "first");

        let comment = client
            .issues()
            .create_comment("o", "r", 5, "second")
            .await
            .unwrap();
        assert_eq!(comment.id, 11);
    }
}
