//! Mock transport for testing code built on the REST core.

use crate::errors::{GitHubError, GitHubResult};
use crate::transport::{HttpTransport, TransportRequest, TransportResponse};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// A scripted mock response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// Status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
    /// Headers.
    pub headers: HashMap<String, String>,
    /// Delay before responding.
    pub delay: Option<std::time::Duration>,
    /// Fail at the transport level instead of responding.
    pub transport_error: bool,
}

impl MockResponse {
    /// Creates a response with a status and raw body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: HashMap::new(),
            delay: None,
            transport_error: false,
        }
    }

    /// Creates a successful response with the given body.
    pub fn ok<T: Serialize>(body: &T) -> Self {
        Self::new(200, serde_json::to_string(body).unwrap_or_default())
    }

    /// Creates a 201 Created response.
    pub fn created<T: Serialize>(body: &T) -> Self {
        Self::new(201, serde_json::to_string(body).unwrap_or_default())
    }

    /// Creates a 202 Accepted response with an empty body.
    pub fn accepted() -> Self {
        Self::new(202, "")
    }

    /// Creates a 204 No Content response.
    pub fn no_content() -> Self {
        Self::new(204, "")
    }

    /// Creates a 404 Not Found response.
    pub fn not_found(message: &str) -> Self {
        Self::error(404, message)
    }

    /// Creates a 422 Validation Failed response.
    pub fn validation_failed(message: &str, errors: Vec<(&str, &str, &str)>) -> Self {
        let errors: Vec<_> = errors
            .into_iter()
            .map(|(resource, field, code)| {
                serde_json::json!({
                    "resource": resource,
                    "field": field,
                    "code": code
                })
            })
            .collect();

        Self::new(
            422,
            serde_json::json!({
                "message": message,
                "errors": errors,
                "documentation_url": "https://docs.github.com/rest"
            })
            .to_string(),
        )
    }

    /// Creates an error response with a GitHub-style body.
    pub fn error(status: u16, message: &str) -> Self {
        Self::new(
            status,
            serde_json::json!({
                "message": message,
                "documentation_url": "https://docs.github.com/rest"
            })
            .to_string(),
        )
    }

    /// Creates a primary rate limit exceeded response.
    pub fn rate_limited() -> Self {
        let reset_at = Utc::now() + Duration::minutes(1);
        Self::error(403, "API rate limit exceeded").with_rate_limit(5000, 0, reset_at.timestamp())
    }

    /// Creates a secondary rate limit response.
    pub fn secondary_rate_limited(retry_after_secs: u64) -> Self {
        Self::error(403, "You have exceeded a secondary rate limit")
            .with_header("retry-after", &retry_after_secs.to_string())
    }

    /// Creates a 500 Internal Server Error response.
    pub fn server_error(message: &str) -> Self {
        Self::error(500, message)
    }

    /// Creates a transport-level failure.
    pub fn transport_error() -> Self {
        Self {
            transport_error: true,
            ..Self::new(0, "")
        }
    }

    /// Adds a delay to the response.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Adds a header to the response.
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_lowercase(), value.to_string());
        self
    }

    /// Adds a `Link` header with a `next` relation.
    pub fn with_next(self, url: &str) -> Self {
        self.with_header("link", &format!("<{}>; rel=\"next\"", url))
    }

    /// Adds rate limit headers.
    pub fn with_rate_limit(self, limit: u32, remaining: u32, reset_timestamp: i64) -> Self {
        self.with_header("x-ratelimit-limit", &limit.to_string())
            .with_header("x-ratelimit-remaining", &remaining.to_string())
            .with_header("x-ratelimit-reset", &reset_timestamp.to_string())
    }

    fn into_transport(self) -> GitHubResult<TransportResponse> {
        let status = StatusCode::from_u16(self.status).map_err(|e| {
            GitHubError::transport(format!("Invalid mock status {}: {}", self.status, e))
        })?;

        let mut headers = HeaderMap::new();
        for (key, value) in &self.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| GitHubError::transport(format!("Invalid mock header: {}", e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| GitHubError::transport(format!("Invalid mock header: {}", e)))?;
            headers.insert(name, value);
        }

        Ok(TransportResponse {
            status,
            headers,
            body: Bytes::from(self.body),
        })
    }
}

/// A recorded mock request.
#[derive(Debug, Clone)]
pub struct MockRequest {
    /// HTTP method.
    pub method: String,
    /// Absolute URL.
    pub url: String,
    /// Request headers as lowercase name/value pairs.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<String>,
    /// Timestamp.
    pub timestamp: DateTime<Utc>,
}

impl MockRequest {
    /// Gets a request header by lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Transport returning scripted responses per `METHOD url`, in order.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    requests: Arc<Mutex<Vec<MockRequest>>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for a method and absolute URL.
    pub fn register(&self, method: &str, url: &str, response: MockResponse) {
        let key = format!("{} {}", method.to_uppercase(), url);
        if let Ok(mut store) = self.responses.lock() {
            store.entry(key).or_default().push_back(response);
        }
    }

    /// Queues a GET response.
    pub fn on_get(&self, url: &str, response: MockResponse) {
        self.register("GET", url, response);
    }

    /// Queues a POST response.
    pub fn on_post(&self, url: &str, response: MockResponse) {
        self.register("POST", url, response);
    }

    /// Queues a PUT response.
    pub fn on_put(&self, url: &str, response: MockResponse) {
        self.register("PUT", url, response);
    }

    /// Queues a PATCH response.
    pub fn on_patch(&self, url: &str, response: MockResponse) {
        self.register("PATCH", url, response);
    }

    /// Queues a DELETE response.
    pub fn on_delete(&self, url: &str, response: MockResponse) {
        self.register("DELETE", url, response);
    }

    /// Returns every request sent so far.
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Returns the number of requests sent so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: TransportRequest) -> GitHubResult<TransportResponse> {
        let headers = request
            .headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(MockRequest {
                method: request.method.to_string(),
                url: request.url.clone(),
                headers,
                body: request
                    .body
                    .as_ref()
                    .map(|b| String::from_utf8_lossy(b).into_owned()),
                timestamp: Utc::now(),
            });
        }

        let key = format!("{} {}", request.method, request.url);
        let response = self
            .responses
            .lock()
            .ok()
            .and_then(|mut store| store.get_mut(&key).and_then(VecDeque::pop_front));

        match response {
            Some(resp) => {
                if let Some(delay) = resp.delay {
                    tokio::time::sleep(delay).await;
                }
                if resp.transport_error {
                    return Err(GitHubError::transport(format!(
                        "Connection failed: mock transport error for {}",
                        key
                    )));
                }
                resp.into_transport()
            }
            None => MockResponse::not_found(&format!("No mock response for {}", key))
                .into_transport(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    fn get(url: &str) -> TransportRequest {
        TransportRequest {
            method: Method::GET,
            url: url.to_string(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_responses_are_served_in_order() {
        let transport = MockTransport::new();
        transport.on_get("https://api.test/a", MockResponse::server_error("boom"));
        transport.on_get("https://api.test/a", MockResponse::ok(&serde_json::json!([1])));

        let first = transport.send(get("https://api.test/a")).await.unwrap();
        let second = transport.send(get("https://api.test/a")).await.unwrap();
        let third = transport.send(get("https://api.test/a")).await.unwrap();

        assert_eq!(first.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(second.status, StatusCode::OK);
        assert_eq!(third.status, StatusCode::NOT_FOUND);
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_headers_are_returned() {
        let transport = MockTransport::new();
        transport.on_get(
            "https://api.test/b",
            MockResponse::ok(&serde_json::json!([])).with_next("https://api.test/b?page=2"),
        );

        let response = transport.send(get("https://api.test/b")).await.unwrap();
        assert_eq!(
            response.headers.get("link").and_then(|v| v.to_str().ok()),
            Some("<https://api.test/b?page=2>; rel=\"next\"")
        );
    }

    #[tokio::test]
    async fn test_transport_error() {
        let transport = MockTransport::new();
        transport.on_get("https://api.test/c", MockResponse::transport_error());
        assert!(transport.send(get("https://api.test/c")).await.is_err());
    }
}
