//! Rate limit status.

use crate::client::GitHubClient;
use crate::errors::GitHubResult;
use crate::request::RequestDescriptor;
use crate::types::RateLimitStatus;

/// Service for `GET /rate_limit`. Calls to it do not count against the quota.
pub struct RateLimitService<'a> {
    client: &'a GitHubClient,
}

impl<'a> RateLimitService<'a> {
    /// Creates a new rate limit service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Gets the current rate limit status for the resolved token.
    pub async fn get(&self) -> GitHubResult<RateLimitStatus> {
        let request = RequestDescriptor::get("/rate_limit")
            .description("Getting rate limit status")
            .telemetry_event("rate_limit.get");
        self.client.request(request).await
    }
}
