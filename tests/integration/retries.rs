//! Integration tests for retry and rate-limit handling

use super::*;
use integrations_github_rest::{invoke_single, GitHubErrorKind, RequestDescriptor};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r"))
        .respond_with(error_response(502, "Bad Gateway"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r"))
        .respond_with(success_response(json!({"name": "r"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = test_context(&mock_server, 3);
    let value = invoke_single(&ctx, &RequestDescriptor::get("repos/o/r").build())
        .await
        .unwrap();

    assert_eq!(value["name"], "r");
}

#[tokio::test]
async fn test_server_errors_exhaust_attempts() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r"))
        .respond_with(error_response(503, "Service Unavailable"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let ctx = test_context(&mock_server, 3);
    let error = invoke_single(&ctx, &RequestDescriptor::get("repos/o/r").build())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), GitHubErrorKind::ServerError);
    assert_eq!(error.status_code(), Some(503));
    assert_eq!(error.attempts(), 3);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/repos/o/r/labels"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Validation Failed",
            "errors": [{"resource": "Label", "code": "already_exists", "field": "name"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = test_context(&mock_server, 5);
    let request = RequestDescriptor::post("repos/o/r/labels")
        .body(json!({"name": "bug", "color": "d73a4a"}))
        .build();
    let error = invoke_single(&ctx, &request).await.unwrap_err();

    assert_eq!(error.kind(), GitHubErrorKind::ClientError);
    assert_eq!(error.status_code(), Some(422));
    assert_eq!(
        error.payload().and_then(|p| p["errors"][0]["code"].as_str()),
        Some("already_exists")
    );
}

#[tokio::test]
async fn test_secondary_rate_limit_honours_retry_after() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/search/code"))
        .respond_with(
            error_response(403, "You have exceeded a secondary rate limit")
                .insert_header("retry-after", "0"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search/code"))
        .respond_with(success_response(json!({"total_count": 0, "items": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = test_context(&mock_server, 3);
    let value = invoke_single(&ctx, &RequestDescriptor::get("search/code").build())
        .await
        .unwrap();

    assert_eq!(value["total_count"], 0);
}

#[tokio::test]
async fn test_exhausted_quota_fails_fast() {
    let mock_server = setup_mock_server().await;
    let reset = (chrono::Utc::now() + chrono::Duration::minutes(30)).timestamp();

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(
            error_response(403, "API rate limit exceeded")
                .insert_header("x-ratelimit-limit", "5000")
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", reset.to_string().as_str()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = test_context(&mock_server, 3);
    let request = RequestDescriptor::get("user").build();

    let first = invoke_single(&ctx, &request).await.unwrap_err();
    assert_eq!(first.kind(), GitHubErrorKind::RateLimited);
    assert_eq!(first.attempts(), 1);

    // The second call never reaches the server.
    let second = invoke_single(&ctx, &request).await.unwrap_err();
    assert_eq!(second.kind(), GitHubErrorKind::RateLimited);
    assert_eq!(second.attempts(), 0);
}

#[tokio::test]
async fn test_malformed_success_body() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = test_context(&mock_server, 3);
    let error = invoke_single(&ctx, &RequestDescriptor::get("user").build())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), GitHubErrorKind::DecodeError);
}

#[tokio::test]
async fn test_concurrent_calls_share_one_context() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/labels"))
        .respond_with(
            success_response(json!([{"id": 1, "name": "bug", "color": "d73a4a"}]))
                .insert_header("x-ratelimit-limit", "5000")
                .insert_header("x-ratelimit-remaining", "4000"),
        )
        .expect(8)
        .mount(&mock_server)
        .await;

    let ctx = test_context(&mock_server, 3);
    let request = RequestDescriptor::get("repos/o/r/labels").build();
    let calls = (0..8).map(|_| invoke_single(&ctx, &request));
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(|r| r.is_ok()));
}
