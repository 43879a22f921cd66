//! Integration tests for typed endpoint services

use super::*;
use integrations_github_rest::services::{CreateLabelRequest, ListIssuesParams, IssueStateFilter};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::Mock;

#[tokio::test]
async fn test_create_label_sends_headers_and_body() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/repos/o/r/labels", "POST")
        .and(header("X-GitHub-Api-Version", "2022-11-28"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"name": "bug", "color": "d73a4a"})))
        .respond_with(
            wiremock::ResponseTemplate::new(201)
                .set_body_json(json!({"id": 1, "name": "bug", "color": "d73a4a"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server, 1);
    let label = client
        .labels()
        .create("o", "r", &CreateLabelRequest::new("bug", "#d73a4a"))
        .await
        .unwrap();

    assert_eq!(label.name, "bug");
}

#[tokio::test]
async fn test_list_issues_with_filters() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/repos/o/r/issues", "GET")
        .and(query_param("state", "closed"))
        .respond_with(success_response(json!([
            {"id": 1, "number": 1, "title": "Done", "state": "closed"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server, 1);
    let params = ListIssuesParams {
        state: Some(IssueStateFilter::Closed),
        ..Default::default()
    };
    let issues = client.issues().list_with_params("o", "r", &params).await.unwrap();

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].title, "Done");
}

#[tokio::test]
async fn test_explicit_token_overrides_default() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("Authorization", "Bearer other-token"))
        .respond_with(success_response(json!({"id": 2, "login": "other"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server, 1);
    let request = integrations_github_rest::RequestDescriptor::get("/user")
        .access_token(AccessToken::bearer("other-token"));
    let user: integrations_github_rest::UserProfile = client.request(request).await.unwrap();

    assert_eq!(user.user.login, "other");
}

#[tokio::test]
async fn test_check_membership() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/orgs/o/members/member"))
        .respond_with(wiremock::ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/orgs/o/members/stranger"))
        .respond_with(error_response(404, "Not Found"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server, 1);
    assert!(client.organizations().check_membership("o", "member").await.unwrap());
    assert!(!client.organizations().check_membership("o", "stranger").await.unwrap());
}
