//! GitHub API client: typed helpers and endpoint services over the REST core.

use crate::auth::{AccessToken, CredentialProvider};
use crate::config::{GitHubConfig, GitHubConfigBuilder};
use crate::context::InvocationContext;
use crate::errors::{GitHubError, GitHubResult};
use crate::invoke::{self, RestResponse};
use crate::pagination::{Page, PaginationParams};
use crate::request::{CallMode, RequestDescriptor, RequestDescriptorBuilder};
use crate::services::*;
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// GitHub API client.
///
/// Cheap to clone; clones share the default token and rate-limit counters.
#[derive(Clone)]
pub struct GitHubClient {
    ctx: Arc<InvocationContext>,
}

impl GitHubClient {
    /// Creates a new GitHub client.
    pub fn new(config: GitHubConfig) -> GitHubResult<Self> {
        Ok(Self::from_context(Arc::new(InvocationContext::new(config)?)))
    }

    /// Wraps an existing invocation context.
    pub fn from_context(ctx: Arc<InvocationContext>) -> Self {
        Self { ctx }
    }

    /// Creates a new client builder.
    pub fn builder() -> GitHubClientBuilder {
        GitHubClientBuilder::new()
    }

    /// Gets the invocation context.
    pub fn context(&self) -> &InvocationContext {
        &self.ctx
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.ctx.config().base_url
    }

    /// Replaces the session default token.
    pub async fn set_token(&self, token: AccessToken) {
        self.ctx.set_default_token(token).await;
    }

    /// Clears the session default token.
    pub async fn clear_token(&self) {
        self.ctx.clear_default_token().await;
    }

    /// Seeds the session default token from a credential provider.
    pub async fn authenticate_with(&self, provider: &dyn CredentialProvider) -> GitHubResult<()> {
        self.ctx.authenticate_with(provider).await
    }

    // Service accessors

    /// Gets the repositories service.
    pub fn repositories(&self) -> RepositoriesService {
        RepositoriesService::new(self)
    }

    /// Gets the issues service.
    pub fn issues(&self) -> IssuesService {
        IssuesService::new(self)
    }

    /// Gets the labels service.
    pub fn labels(&self) -> LabelsService {
        LabelsService::new(self)
    }

    /// Gets the pull requests service.
    pub fn pull_requests(&self) -> PullRequestsService {
        PullRequestsService::new(self)
    }

    /// Gets the teams service.
    pub fn teams(&self) -> TeamsService {
        TeamsService::new(self)
    }

    /// Gets the users service.
    pub fn users(&self) -> UsersService {
        UsersService::new(self)
    }

    /// Gets the organizations service.
    pub fn organizations(&self) -> OrganizationsService {
        OrganizationsService::new(self)
    }

    /// Gets the rate limit service.
    pub fn rate_limit(&self) -> RateLimitService {
        RateLimitService::new(self)
    }

    // Raw invocation

    /// Runs a request descriptor in the given mode.
    pub async fn execute(
        &self,
        request: &RequestDescriptor,
        mode: CallMode,
    ) -> GitHubResult<invoke::RestResult> {
        invoke::invoke(&self.ctx, request, mode).await
    }

    /// Runs a request descriptor, observing a cancellation token.
    pub async fn execute_with_cancellation(
        &self,
        request: &RequestDescriptor,
        mode: CallMode,
        cancel: &CancellationToken,
    ) -> GitHubResult<invoke::RestResult> {
        invoke::invoke_with_cancellation(&self.ctx, request, mode, Some(cancel)).await
    }

    /// Runs a single-result request and keeps headers-derived metadata.
    pub async fn execute_extended(&self, request: &RequestDescriptor) -> GitHubResult<RestResponse> {
        invoke::invoke_extended(&self.ctx, request).await
    }

    // Typed helpers

    /// Makes a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> GitHubResult<T> {
        self.request(RequestDescriptor::get(path)).await
    }

    /// Makes a GET request with query parameters.
    pub async fn get_with_params<T: DeserializeOwned, P: Serialize>(
        &self,
        path: &str,
        params: &P,
    ) -> GitHubResult<T> {
        self.request(RequestDescriptor::get(path).query(params)?).await
    }

    /// Makes a GET request following every `next` link.
    pub async fn list<T: DeserializeOwned>(&self, path: &str) -> GitHubResult<Vec<T>> {
        self.request_all(RequestDescriptor::get(path)).await
    }

    /// Makes a GET request with query parameters, following every `next` link.
    pub async fn list_with_params<T: DeserializeOwned, P: Serialize>(
        &self,
        path: &str,
        params: &P,
    ) -> GitHubResult<Vec<T>> {
        self.request_all(RequestDescriptor::get(path).query(params)?).await
    }

    /// Makes a GET request for a single page.
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        pagination: &PaginationParams,
    ) -> GitHubResult<Page<T>> {
        let request = RequestDescriptor::get(path).query(pagination)?.build();
        invoke::invoke_first_page(&self.ctx, &request)
            .await?
            .try_map(from_value)
    }

    /// Makes a POST request.
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> GitHubResult<T> {
        self.request(RequestDescriptor::post(path).json(body)?).await
    }

    /// Makes a POST request without a response body.
    pub async fn post_no_response<B: Serialize>(&self, path: &str, body: &B) -> GitHubResult<()> {
        self.request_no_response(RequestDescriptor::post(path).json(body)?).await
    }

    /// Makes a PUT request.
    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> GitHubResult<T> {
        self.request(RequestDescriptor::put(path).json(body)?).await
    }

    /// Makes a PUT request without a response body.
    pub async fn put_no_response<B: Serialize>(&self, path: &str, body: &B) -> GitHubResult<()> {
        self.request_no_response(RequestDescriptor::put(path).json(body)?).await
    }

    /// Makes a PATCH request.
    pub async fn patch<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> GitHubResult<T> {
        self.request(RequestDescriptor::patch(path).json(body)?).await
    }

    /// Makes a DELETE request.
    pub async fn delete(&self, path: &str) -> GitHubResult<()> {
        self.request_no_response(RequestDescriptor::delete(path)).await
    }

    /// Makes a DELETE request with a body.
    pub async fn delete_with_body<B: Serialize>(&self, path: &str, body: &B) -> GitHubResult<()> {
        self.request_no_response(RequestDescriptor::builder(Method::DELETE, path).json(body)?)
            .await
    }

    /// Probes an endpoint that answers 204 for yes and 404 for no.
    pub async fn check(&self, request: RequestDescriptorBuilder) -> GitHubResult<bool> {
        match invoke::invoke_single(&self.ctx, &request.build()).await {
            Ok(_) => Ok(true),
            Err(e) if e.status_code() == Some(404) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Runs a descriptor and decodes the single result.
    pub async fn request<T: DeserializeOwned>(&self, request: RequestDescriptorBuilder) -> GitHubResult<T> {
        let value = invoke::invoke_single(&self.ctx, &request.build()).await?;
        from_value(value)
    }

    /// Runs a descriptor across all pages and decodes every item.
    pub async fn request_all<T: DeserializeOwned>(
        &self,
        request: RequestDescriptorBuilder,
    ) -> GitHubResult<Vec<T>> {
        invoke::invoke_multiple(&self.ctx, &request.build())
            .await?
            .into_iter()
            .map(from_value)
            .collect()
    }

    /// Runs a descriptor and discards the body.
    pub async fn request_no_response(&self, request: RequestDescriptorBuilder) -> GitHubResult<()> {
        invoke::invoke_single(&self.ctx, &request.build()).await?;
        Ok(())
    }
}

fn from_value<T: DeserializeOwned>(value: Value) -> GitHubResult<T> {
    serde_json::from_value(value).map_err(|e| {
        GitHubError::deserialization(format!("Failed to deserialize response: {}", e)).with_cause(e)
    })
}

/// Builder for GitHubClient.
pub struct GitHubClientBuilder {
    config_builder: GitHubConfigBuilder,
}

impl GitHubClientBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config_builder: GitHubConfig::builder(),
        }
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(url);
        self
    }

    /// Targets a GitHub Enterprise Server host.
    pub fn api_host(mut self, host: &str) -> Self {
        self.config_builder = self.config_builder.api_host(host);
        self
    }

    /// Sets the default access token.
    pub fn token(mut self, token: AccessToken) -> Self {
        self.config_builder = self.config_builder.token(token);
        self
    }

    /// Sets a personal access token.
    pub fn pat(self, token: impl Into<String>) -> Self {
        self.token(AccessToken::bearer(token))
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the User-Agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.user_agent(ua);
        self
    }

    /// Disables retries.
    pub fn no_retry(mut self) -> Self {
        self.config_builder = self.config_builder.no_retry();
        self
    }

    /// Reads token and host from the environment.
    pub fn from_env(mut self) -> Self {
        self.config_builder = self.config_builder.from_env();
        self
    }

    /// Builds the client.
    pub fn build(self) -> GitHubResult<GitHubClient> {
        let config = self.config_builder.build()?;
        GitHubClient::new(config)
    }
}

impl Default for GitHubClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
