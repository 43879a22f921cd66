//! Label operations.

use super::encode_segment;
use crate::client::GitHubClient;
use crate::errors::GitHubResult;
use crate::request::RequestDescriptor;
use crate::types::Label;
use serde::Serialize;

/// Preview media type that adds label descriptions on older Enterprise Server releases.
pub const LABEL_PREVIEW_ACCEPT: &str = "application/vnd.github.symmetra-preview+json";

/// Service for repository and issue labels.
pub struct LabelsService<'a> {
    client: &'a GitHubClient,
}

impl<'a> LabelsService<'a> {
    /// Creates a new labels service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Lists labels in a repository, all pages.
    pub async fn list(&self, owner: &str, repo: &str) -> GitHubResult<Vec<Label>> {
        let request = RequestDescriptor::get(format!("/repos/{}/{}/labels", owner, repo))
            .accept(LABEL_PREVIEW_ACCEPT)
            .description(format!("Getting labels for {}/{}", owner, repo))
            .telemetry_event("labels.list");
        self.client.request_all(request).await
    }

    /// Lists labels on an issue, all pages.
    pub async fn list_for_issue(
        &self,
        owner: &str,
        repo: &str,
        issue_number: u64,
    ) -> GitHubResult<Vec<Label>> {
        let request = RequestDescriptor::get(format!(
            "/repos/{}/{}/issues/{}/labels",
            owner, repo, issue_number
        ))
        .accept(LABEL_PREVIEW_ACCEPT)
        .description(format!(
            "Getting labels for issue #{} in {}/{}",
            issue_number, owner, repo
        ))
        .telemetry_event("labels.list_for_issue");
        self.client.request_all(request).await
    }

    /// Gets a label by name.
    pub async fn get(&self, owner: &str, repo: &str, name: &str) -> GitHubResult<Label> {
        let request = RequestDescriptor::get(format!(
            "/repos/{}/{}/labels/{}",
            owner,
            repo,
            encode_segment(name)
        ))
        .accept(LABEL_PREVIEW_ACCEPT)
        .description(format!("Getting label \"{}\" for {}/{}", name, owner, repo))
        .telemetry_event("labels.get");
        self.client.request(request).await
    }

    /// Creates a label.
    pub async fn create(
        &self,
        owner: &str,
        repo: &str,
        request: &CreateLabelRequest,
    ) -> GitHubResult<Label> {
        let descriptor = RequestDescriptor::post(format!("/repos/{}/{}/labels", owner, repo))
            .json(&request.normalized())?
            .accept(LABEL_PREVIEW_ACCEPT)
            .description(format!(
                "Creating label \"{}\" in {}/{}",
                request.name, owner, repo
            ))
            .telemetry_event("labels.create");
        self.client.request(descriptor).await
    }

    /// Updates a label.
    pub async fn update(
        &self,
        owner: &str,
        repo: &str,
        name: &str,
        request: &UpdateLabelRequest,
    ) -> GitHubResult<Label> {
        let descriptor = RequestDescriptor::patch(format!(
            "/repos/{}/{}/labels/{}",
            owner,
            repo,
            encode_segment(name)
        ))
        .json(&request.normalized())?
        .accept(LABEL_PREVIEW_ACCEPT)
        .description(format!("Updating label \"{}\" in {}/{}", name, owner, repo))
        .telemetry_event("labels.update");
        self.client.request(descriptor).await
    }

    /// Deletes a label.
    pub async fn delete(&self, owner: &str, repo: &str, name: &str) -> GitHubResult<()> {
        let request = RequestDescriptor::delete(format!(
            "/repos/{}/{}/labels/{}",
            owner,
            repo,
            encode_segment(name)
        ))
        .description(format!("Deleting label \"{}\" from {}/{}", name, owner, repo))
        .telemetry_event("labels.delete");
        self.client.request_no_response(request).await
    }

    /// Adds labels to an issue, returning the issue's full label set.
    pub async fn add_to_issue(
        &self,
        owner: &str,
        repo: &str,
        issue_number: u64,
        labels: &[String],
    ) -> GitHubResult<Vec<Label>> {
        let payload = IssueLabelsRequest {
            labels: labels.to_vec(),
        };
        let request = RequestDescriptor::post(format!(
            "/repos/{}/{}/issues/{}/labels",
            owner, repo, issue_number
        ))
        .json(&payload)?
        .accept(LABEL_PREVIEW_ACCEPT)
        .description(format!(
            "Adding labels to issue #{} in {}/{}",
            issue_number, owner, repo
        ))
        .telemetry_event("labels.add_to_issue");
        self.client.request(request).await
    }

    /// Replaces every label on an issue.
    pub async fn set_for_issue(
        &self,
        owner: &str,
        repo: &str,
        issue_number: u64,
        labels: &[String],
    ) -> GitHubResult<Vec<Label>> {
        let payload = IssueLabelsRequest {
            labels: labels.to_vec(),
        };
        let request = RequestDescriptor::put(format!(
            "/repos/{}/{}/issues/{}/labels",
            owner, repo, issue_number
        ))
        .json(&payload)?
        .accept(LABEL_PREVIEW_ACCEPT)
        .description(format!(
            "Replacing labels on issue #{} in {}/{}",
            issue_number, owner, repo
        ))
        .telemetry_event("labels.set_for_issue");
        self.client.request(request).await
    }

    /// Removes a label from an issue.
    pub async fn remove_from_issue(
        &self,
        owner: &str,
        repo: &str,
        issue_number: u64,
        label: &str,
    ) -> GitHubResult<()> {
        let request = RequestDescriptor::delete(format!(
            "/repos/{}/{}/issues/{}/labels/{}",
            owner,
            repo,
            issue_number,
            encode_segment(label)
        ))
        .description(format!(
            "Removing label \"{}\" from issue #{} in {}/{}",
            label, issue_number, owner, repo
        ))
        .telemetry_event("labels.remove_from_issue");
        self.client.request_no_response(request).await
    }
}

/// Request to create a label.
#[derive(Debug, Clone, Serialize)]
pub struct CreateLabelRequest {
    /// Label name.
    pub name: String,
    /// Label color, six hex digits; a leading `#` is stripped.
    pub color: String,
    /// Label description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateLabelRequest {
    /// Creates a request with a name and color.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            description: None,
        }
    }

    fn normalized(&self) -> Self {
        Self {
            color: strip_hash(&self.color),
            ..self.clone()
        }
    }
}

/// Request to update a label.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateLabelRequest {
    /// New label name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    /// Label color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Label description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateLabelRequest {
    fn normalized(&self) -> Self {
        Self {
            color: self.color.as_deref().map(strip_hash),
            ..self.clone()
        }
    }
}

fn strip_hash(color: &str) -> String {
    color.trim_start_matches('#').to_string()
}

#[derive(Debug, Clone, Serialize)]
struct IssueLabelsRequest {
    labels: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::mock_client;
    use crate::errors::GitHubErrorKind;
    use crate::mocks::MockResponse;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_list_sends_preview_accept() {
        let (client, transport) = mock_client();
        transport.on_get(
            "https://api.test/repos/o/r/labels",
            MockResponse::ok(&json!([{"id": 1, "name": "bug", "color": "d73a4a"}])),
        );

        let labels = client.labels().list("o", "r").await.unwrap();
        assert_eq!(labels[0].name, "bug");

        let sent = transport.requests();
        assert_eq!(
            sent[0].header("accept"),
            Some("application/vnd.github.symmetra-preview+json, application/vnd.github+json")
        );
    }

    #[tokio::test]
    async fn test_create_strips_hash() {
        let (client, transport) = mock_client();
        transport.on_post(
            "https://api.test/repos/o/r/labels",
            MockResponse::created(&json!({"id": 2, "name": "docs", "color": "0075ca"})),
        );

        let label = client
            .labels()
            .create("o", "r", &CreateLabelRequest::new("docs", "#0075ca"))
            .await
            .unwrap();
        assert_eq!(label.color, "0075ca");

        let body: Value =
            serde_json::from_str(transport.requests()[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"name": "docs", "color": "0075ca"}));
    }

    #[tokio::test]
    async fn test_names_are_encoded() {
        let (client, transport) = mock_client();
        transport.on_get(
            "https://api.test/repos/o/r/labels/good%20first%20issue",
            MockResponse::ok(&json!({"id": 3, "name": "good first issue", "color": "7057ff"})),
        );
        transport.on_delete(
            "https://api.test/repos/o/r/issues/9/labels/good%20first%20issue",
            MockResponse::no_content(),
        );

        let label = client.labels().get("o", "r", "good first issue").await.unwrap();
        assert_eq!(label.id, 3);

        client
            .labels()
            .remove_from_issue("o", "r", 9, "good first issue")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_to_issue_and_delete() {
        let (client, transport) = mock_client();
        transport.on_post(
            "https://api.test/repos/o/r/issues/4/labels",
            MockResponse::ok(&json!([{"name": "bug"}, {"name": "p1"}])),
        );
        transport.on_delete("https://api.test/repos/o/r/labels/stale", MockResponse::not_found("Not Found"));

        let labels = client
            .labels()
            .add_to_issue("o", "r", 4, &["p1".to_string()])
            .await
            .unwrap();
        assert_eq!(labels.len(), 2);

        let error = client.labels().delete("o", "r", "stale").await.unwrap_err();
        assert_eq!(error.kind(), GitHubErrorKind::ClientError);
    }
}
