//! Integration tests using WireMock
//!
//! These tests drive the real `reqwest` transport against a mock HTTP server,
//! covering header construction, `Link` pagination, retries and error
//! classification end to end.

pub mod pagination;
pub mod retries;
pub mod services;

use integrations_github_rest::config::RetryConfig;
use integrations_github_rest::{AccessToken, GitHubClient, GitHubConfig, InvocationContext};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

/// Token used by every authenticated test client.
pub const TEST_TOKEN: &str = "ghp_integration";

/// Helper to start a mock server.
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Retry settings with millisecond backoff.
pub fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_backoff: Duration::from_millis(5),
        max_backoff: Duration::from_millis(20),
        multiplier: 2.0,
        jitter: 0.0,
        enabled: true,
    }
}

/// Configuration pointing at the mock server.
pub fn test_config(server: &MockServer, max_attempts: u32) -> GitHubConfig {
    GitHubConfig::builder()
        .base_url(server.uri())
        .token(AccessToken::bearer(TEST_TOKEN))
        .retry(fast_retry(max_attempts))
        .build()
        .expect("valid test configuration")
}

/// Invocation context pointing at the mock server.
pub fn test_context(server: &MockServer, max_attempts: u32) -> Arc<InvocationContext> {
    Arc::new(InvocationContext::new(test_config(server, max_attempts)).expect("context"))
}

/// Client pointing at the mock server.
pub fn test_client(server: &MockServer, max_attempts: u32) -> GitHubClient {
    GitHubClient::from_context(test_context(server, max_attempts))
}

/// Helper to create an authenticated mock.
pub fn mock_with_auth(path_matcher: &str, method_matcher: &str) -> MockBuilder {
    Mock::given(method(method_matcher))
        .and(path(path_matcher))
        .and(header("Authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
}

/// Helper to create error response templates.
pub fn error_response(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(serde_json::json!({
        "message": message,
        "documentation_url": "https://docs.github.com/rest"
    }))
}

/// Helper to create success response templates.
pub fn success_response(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}
