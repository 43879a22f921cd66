//! Pull request operations.

use super::SortDirection;
use crate::client::GitHubClient;
use crate::errors::GitHubResult;
use crate::request::RequestDescriptor;
use crate::types::{PullRequest, PullRequestFile};
use serde::Serialize;

/// Service for pull request operations.
pub struct PullRequestsService<'a> {
    client: &'a GitHubClient,
}

impl<'a> PullRequestsService<'a> {
    /// Creates a new pull requests service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Lists pull requests, all pages.
    pub async fn list(&self, owner: &str, repo: &str) -> GitHubResult<Vec<PullRequest>> {
        self.list_with_params(owner, repo, &ListPullRequestsParams::default())
            .await
    }

    /// Lists pull requests with parameters, all pages.
    pub async fn list_with_params(
        &self,
        owner: &str,
        repo: &str,
        params: &ListPullRequestsParams,
    ) -> GitHubResult<Vec<PullRequest>> {
        let request = RequestDescriptor::get(format!("/repos/{}/{}/pulls", owner, repo))
            .query(params)?
            .description(format!("Getting pull requests for {}/{}", owner, repo))
            .telemetry_event("pull_requests.list");
        self.client.request_all(request).await
    }

    /// Gets a pull request.
    pub async fn get(&self, owner: &str, repo: &str, pull_number: u64) -> GitHubResult<PullRequest> {
        let request = RequestDescriptor::get(format!(
            "/repos/{}/{}/pulls/{}",
            owner, repo, pull_number
        ))
        .description(format!(
            "Getting pull request #{} for {}/{}",
            pull_number, owner, repo
        ))
        .telemetry_event("pull_requests.get");
        self.client.request(request).await
    }

    /// Creates a pull request.
    pub async fn create(
        &self,
        owner: &str,
        repo: &str,
        request: &CreatePullRequestRequest,
    ) -> GitHubResult<PullRequest> {
        let descriptor = RequestDescriptor::post(format!("/repos/{}/{}/pulls", owner, repo))
            .json(request)?
            .description(format!(
                "Creating pull request {} -> {} in {}/{}",
                request.head, request.base, owner, repo
            ))
            .telemetry_event("pull_requests.create");
        self.client.request(descriptor).await
    }

    /// Lists files changed by a pull request, all pages.
    pub async fn list_files(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
    ) -> GitHubResult<Vec<PullRequestFile>> {
        let request = RequestDescriptor::get(format!(
            "/repos/{}/{}/pulls/{}/files",
            owner, repo, pull_number
        ))
        .description(format!(
            "Getting files for pull request #{} in {}/{}",
            pull_number, owner, repo
        ))
        .telemetry_event("pull_requests.files");
        self.client.request_all(request).await
    }
}

/// Parameters for listing pull requests.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListPullRequestsParams {
    /// State filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PullRequestStateFilter>,
    /// Filter by head (`user:ref-name`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    /// Filter by base branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Sort field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<PullRequestSort>,
    /// Sort direction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<SortDirection>,
    /// Items per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

/// Pull request state filter.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestStateFilter {
    /// Open.
    Open,
    /// Closed or merged.
    Closed,
    /// Both.
    All,
}

/// Pull request sort field.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestSort {
    /// Creation time.
    Created,
    /// Last update.
    Updated,
    /// Comment activity.
    Popularity,
    /// Age, filtered by activity.
    LongRunning,
}

/// Request to create a pull request.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePullRequestRequest {
    /// Title.
    pub title: String,
    /// Head branch (`branch` or `user:branch`).
    pub head: String,
    /// Base branch.
    pub base: String,
    /// Body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Open as a draft.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,
    /// Let maintainers push to the head branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainer_can_modify: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::mock_client;
    use crate::mocks::MockResponse;
    use crate::types::PullRequestState;
    use serde_json::{json, Value};

    fn pull(number: u64) -> Value {
        json!({
            "id": number,
            "number": number,
            "title": "Add feature",
            "state": "open",
            "head": {"ref": "feature", "sha": "abc"},
            "base": {"ref": "main", "sha": "def"}
        })
    }

    #[tokio::test]
    async fn test_list_and_get() {
        let (client, transport) = mock_client();
        transport.on_get(
            "https://api.test/repos/o/r/pulls?state=open&base=main",
            MockResponse::ok(&json!([pull(1), pull(2)])),
        );
        transport.on_get("https://api.test/repos/o/r/pulls/2", MockResponse::ok(&pull(2)));

        let params = ListPullRequestsParams {
            state: Some(PullRequestStateFilter::Open),
            base: Some("main".to_string()),
            ..Default::default()
        };
        let pulls = client
            .pull_requests()
            .list_with_params("o", "r", &params)
            .await
            .unwrap();
        assert_eq!(pulls.len(), 2);

        let pr = client.pull_requests().get("o", "r", 2).await.unwrap();
        assert_eq!(pr.state, PullRequestState::Open);
        assert_eq!(pr.head.ref_name, "feature");
    }

    #[tokio::test]
    async fn test_create() {
        let (client, transport) = mock_client();
        transport.on_post("https://api.test/repos/o/r/pulls", MockResponse::created(&pull(3)));

        let request = CreatePullRequestRequest {
            title: "Add feature".to_string(),
            head: "feature".to_string(),
            base: "main".to_string(),
            body: None,
            draft: Some(true),
            maintainer_can_modify: None,
        };
        let pr = client.pull_requests().create("o", "r", &request).await.unwrap();
        assert_eq!(pr.number, 3);

        let body: Value =
            serde_json::from_str(transport.requests()[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["draft"], json!(true));
        assert!(body.get("body").is_none());
    }

    #[tokio::test]
    async fn test_list_files_across_pages() {
        let (client, transport) = mock_client();
        transport.on_get(
            "https://api.test/repos/o/r/pulls/3/files",
            MockResponse::ok(&json!([{"filename": "a.rs", "status": "added", "additions": 10}]))
                .with_next("https://api.test/repos/o/r/pulls/3/files?page=2"),
        );
        transport.on_get(
            "https://api.test/repos/o/r/pulls/3/files?page=2",
            MockResponse::ok(&json!([{"filename": "b.rs", "status": "modified"}])),
        );

        let files = client.pull_requests().list_files("o", "r", 3).await.unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["a.rs", "b.rs"]);
    }
}
