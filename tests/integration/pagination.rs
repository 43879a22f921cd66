//! Integration tests for multi-page calls

use super::*;
use integrations_github_rest::{
    invoke_first_page, invoke_multiple, GitHubErrorKind, RequestDescriptor,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn numbered(range: std::ops::Range<u64>) -> Value {
    Value::Array(range.map(|n| json!({ "number": n })).collect())
}

fn next_link(server: &wiremock::MockServer, path_and_query: &str) -> String {
    format!("<{}{}>; rel=\"next\"", server.uri(), path_and_query)
}

#[tokio::test]
async fn test_multi_page_concatenates_in_order() {
    let mock_server = setup_mock_server().await;

    // Page 2 is mounted first so its query matcher wins over the bare path.
    mock_with_auth("/repos/o/r/issues", "GET")
        .and(query_param("page", "2"))
        .respond_with(success_response(numbered(100..140)))
        .expect(1)
        .mount(&mock_server)
        .await;

    mock_with_auth("/repos/o/r/issues", "GET")
        .respond_with(
            success_response(numbered(0..100))
                .insert_header("link", next_link(&mock_server, "/repos/o/r/issues?page=2").as_str()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = test_context(&mock_server, 3);
    let request = RequestDescriptor::get("repos/o/r/issues").build();
    let items = invoke_multiple(&ctx, &request).await.unwrap();

    assert_eq!(items.len(), 140);
    let numbers: Vec<u64> = items.iter().filter_map(|i| i["number"].as_u64()).collect();
    assert_eq!(numbers, (0..140).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_page_failure_fails_the_call() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("page", "2"))
        .respond_with(error_response(404, "Not Found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(
            success_response(numbered(0..30))
                .insert_header("link", next_link(&mock_server, "/user/repos?page=2").as_str()),
        )
        .mount(&mock_server)
        .await;

    let ctx = test_context(&mock_server, 3);
    let error = invoke_multiple(&ctx, &RequestDescriptor::get("user/repos").build())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), GitHubErrorKind::ClientError);
    assert_eq!(error.status_code(), Some(404));
}

#[tokio::test]
async fn test_first_page_only() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/orgs/o/members"))
        .respond_with(
            success_response(numbered(0..3))
                .insert_header("link", next_link(&mock_server, "/orgs/o/members?page=2").as_str()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = test_context(&mock_server, 1);
    let page = invoke_first_page(&ctx, &RequestDescriptor::get("orgs/o/members").build())
        .await
        .unwrap();

    assert_eq!(page.len(), 3);
    assert!(page.has_next());
}

#[tokio::test]
async fn test_empty_body_contributes_nothing() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/user/following/octocat"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let ctx = test_context(&mock_server, 1);
    let items = invoke_multiple(&ctx, &RequestDescriptor::get("user/following/octocat").build())
        .await
        .unwrap();

    assert!(items.is_empty());
}
