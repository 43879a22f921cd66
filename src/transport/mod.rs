//! HTTP transport layer.
//!
//! The REST core never talks to `reqwest` directly; it hands a fully built
//! [`TransportRequest`] to an [`HttpTransport`] and classifies whatever comes
//! back. Transport failures (connect, timeout, broken body) surface as
//! `ServerError` so the retry policy treats them as transient.

use crate::config::GitHubConfig;
use crate::errors::{GitHubError, GitHubResult};
use crate::observability::redacted_headers;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use tracing::{debug, trace};

/// HTTP transport trait for executing one request.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends the request and returns the raw response.
    async fn send(&self, request: TransportRequest) -> GitHubResult<TransportResponse>;
}

/// A fully built HTTP request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// Serialized body.
    pub body: Option<Bytes>,
}

/// A raw HTTP response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Value of the `X-GitHub-Request-Id` header.
    pub fn request_id(&self) -> Option<String> {
        self.headers
            .get("x-github-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }
}

/// Transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Creates a transport from the client configuration.
    pub fn new(config: &GitHubConfig) -> GitHubResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool.max_idle_per_host)
            .pool_idle_timeout(config.pool.idle_timeout)
            .build()
            .map_err(|e| {
                GitHubError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { http })
    }

    /// Wraps an existing `reqwest` client.
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> GitHubResult<TransportResponse> {
        trace!(
            method = %request.method,
            url = %request.url,
            headers = ?redacted_headers(&request.headers),
            "Sending request"
        );

        let mut builder = self
            .http
            .request(request.method, &request.url)
            .headers(request.headers);

        if let Some(bytes) = request.body {
            builder = builder.body(bytes);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GitHubError::transport(format!("Request timed out: {}", e)).with_cause(e)
            } else if e.is_connect() {
                GitHubError::transport(format!("Connection failed: {}", e)).with_cause(e)
            } else {
                GitHubError::transport(format!("Request failed: {}", e)).with_cause(e)
            }
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            GitHubError::transport(format!("Failed to read response body: {}", e)).with_cause(e)
        })?;

        debug!(status = status.as_u16(), bytes = body.len(), "Transport response received");

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
