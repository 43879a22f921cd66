//! The REST invocation core.
//!
//! One logical call resolves its token once, then drives one or more pages
//! strictly in order. Every page runs the retry state machine from
//! [`crate::resilience`]; any page failure fails the whole call and drops
//! the items gathered so far.

use crate::auth::ResolvedToken;
use crate::context::InvocationContext;
use crate::errors::{GitHubError, GitHubErrorKind, GitHubResult, RateLimitInfo};
use crate::observability::{log_rate_limit_exceeded, log_rate_limit_update, TelemetryEvent};
use crate::pagination::{Page, PaginationLinks};
use crate::request::{CallMode, RequestDescriptor};
use crate::resilience::{
    classify, extract_rate_limit, resource_for_path, retry_after, AttemptOutcome, ResponseClass,
    RetryState,
};
use crate::transport::{TransportRequest, TransportResponse};
use bytes::Bytes;
use chrono::Utc;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT,
};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

/// One decoded HTTP response.
#[derive(Debug, Clone)]
pub struct RestResponse {
    /// Decoded body; `Value::Null` for an empty body.
    pub value: Value,
    /// Pagination links from the `Link` header.
    pub links: PaginationLinks,
    /// Rate limit counters from the response headers.
    pub rate_limit: Option<RateLimitInfo>,
    /// HTTP status code.
    pub status: u16,
    /// `X-GitHub-Request-Id`, if sent.
    pub request_id: Option<String>,
}

/// Result of [`invoke`], shaped by the requested [`CallMode`].
#[derive(Debug, Clone)]
pub enum RestResult {
    /// One response.
    Single(RestResponse),
    /// Items of every page, in order.
    Multiple(Vec<Value>),
    /// The first page and its links.
    FirstPage(Page<Value>),
}

impl RestResult {
    /// Collapses the result into one JSON value.
    pub fn into_value(self) -> Value {
        match self {
            Self::Single(response) => response.value,
            Self::Multiple(items) => Value::Array(items),
            Self::FirstPage(page) => Value::Array(page.into_items()),
        }
    }

    /// Collapses the result into a sequence of items.
    pub fn into_items(self) -> Vec<Value> {
        match self {
            Self::Single(response) => items_of(response.value),
            Self::Multiple(items) => items,
            Self::FirstPage(page) => page.into_items(),
        }
    }
}

/// Runs a logical call in the given mode.
pub async fn invoke(
    ctx: &InvocationContext,
    request: &RequestDescriptor,
    mode: CallMode,
) -> GitHubResult<RestResult> {
    invoke_with_cancellation(ctx, request, mode, None).await
}

/// Runs a logical call in the given mode, observing `cancel` between attempts.
pub async fn invoke_with_cancellation(
    ctx: &InvocationContext,
    request: &RequestDescriptor,
    mode: CallMode,
    cancel: Option<&CancellationToken>,
) -> GitHubResult<RestResult> {
    match mode {
        CallMode::Single => extended(ctx, request, cancel).await.map(RestResult::Single),
        CallMode::AllPages => multiple(ctx, request, cancel).await.map(RestResult::Multiple),
        CallMode::FirstPage => first_page(ctx, request, cancel).await.map(RestResult::FirstPage),
    }
}

/// Single-result call returning the decoded body.
pub async fn invoke_single(
    ctx: &InvocationContext,
    request: &RequestDescriptor,
) -> GitHubResult<Value> {
    extended(ctx, request, None).await.map(|r| r.value)
}

/// Single-result call returning the body with links and rate-limit counters.
pub async fn invoke_extended(
    ctx: &InvocationContext,
    request: &RequestDescriptor,
) -> GitHubResult<RestResponse> {
    extended(ctx, request, None).await
}

/// Multi-page call returning every page's items in order.
pub async fn invoke_multiple(
    ctx: &InvocationContext,
    request: &RequestDescriptor,
) -> GitHubResult<Vec<Value>> {
    multiple(ctx, request, None).await
}

/// Fetches only the first page, keeping its links for manual paging.
pub async fn invoke_first_page(
    ctx: &InvocationContext,
    request: &RequestDescriptor,
) -> GitHubResult<Page<Value>> {
    first_page(ctx, request, None).await
}

#[instrument(skip_all, fields(method = %request.method(), uri = %request.uri_fragment()))]
async fn extended(
    ctx: &InvocationContext,
    request: &RequestDescriptor,
    cancel: Option<&CancellationToken>,
) -> GitHubResult<RestResponse> {
    let mut call = Call::start(ctx, request, cancel).await;
    let result = bounded(ctx, call.single()).await;
    call.finish(result)
}

#[instrument(skip_all, fields(method = %request.method(), uri = %request.uri_fragment()))]
async fn multiple(
    ctx: &InvocationContext,
    request: &RequestDescriptor,
    cancel: Option<&CancellationToken>,
) -> GitHubResult<Vec<Value>> {
    let mut call = Call::start(ctx, request, cancel).await;
    let result = bounded(ctx, call.all_pages()).await;
    call.finish(result)
}

#[instrument(skip_all, fields(method = %request.method(), uri = %request.uri_fragment()))]
async fn first_page(
    ctx: &InvocationContext,
    request: &RequestDescriptor,
    cancel: Option<&CancellationToken>,
) -> GitHubResult<Page<Value>> {
    let mut call = Call::start(ctx, request, cancel).await;
    let result = bounded(ctx, call.first_page()).await;
    call.finish(result)
}

async fn bounded<T>(
    ctx: &InvocationContext,
    future: impl Future<Output = GitHubResult<T>>,
) -> GitHubResult<T> {
    match ctx.config().call_timeout {
        Some(limit) => tokio::time::timeout(limit, future).await.unwrap_or_else(|_| {
            Err(GitHubError::cancelled(format!(
                "Call exceeded timeout of {}ms",
                limit.as_millis()
            )))
        }),
        None => future.await,
    }
}

/// State of one logical call.
struct Call<'a> {
    ctx: &'a InvocationContext,
    request: &'a RequestDescriptor,
    cancel: Option<&'a CancellationToken>,
    token: ResolvedToken,
    rate_key: String,
    call_id: String,
    started: Instant,
    pages: u32,
    attempts: u32,
}

impl<'a> Call<'a> {
    async fn start(
        ctx: &'a InvocationContext,
        request: &'a RequestDescriptor,
        cancel: Option<&'a CancellationToken>,
    ) -> Call<'a> {
        let token = ctx.resolve_token(request.access_token()).await;
        let rate_key = token.rate_limit_key();
        let call_id = uuid::Uuid::new_v4().to_string();

        debug!(
            call_id = %call_id,
            token_source = ?token.source,
            description = %request.description(),
            "Starting GitHub API call"
        );

        Call {
            ctx,
            request,
            cancel,
            token,
            rate_key,
            call_id,
            started: Instant::now(),
            pages: 0,
            attempts: 0,
        }
    }

    async fn single(&mut self) -> GitHubResult<RestResponse> {
        let url = build_url(&self.ctx.config().base_url, self.request.uri_fragment())?;
        self.fetch_page(&url).await
    }

    async fn first_page(&mut self) -> GitHubResult<Page<Value>> {
        let response = self.single().await?;
        Ok(Page::new(items_of(response.value), response.links))
    }

    async fn all_pages(&mut self) -> GitHubResult<Vec<Value>> {
        let base_url = self.ctx.config().base_url.clone();
        let threshold = self.ctx.config().progress.multi_request_threshold;
        let mut url = build_url(&base_url, self.request.uri_fragment())?;
        let mut visited = HashSet::new();
        let mut items = Vec::new();

        loop {
            visited.insert(url.clone());
            let response = self.fetch_page(&url).await?;
            items.extend(items_of(response.value));

            if self.pages >= threshold {
                self.ctx
                    .progress()
                    .on_page(self.request.description(), self.pages, items.len());
            }

            match response.links.next {
                Some(next) => {
                    ensure_same_origin(&base_url, &next)?;
                    if visited.contains(&next) {
                        return Err(GitHubError::transport(format!(
                            "Pagination link cycle detected at {}",
                            next
                        )));
                    }
                    url = next;
                }
                None => break,
            }
        }

        Ok(items)
    }

    /// Fetches one page, retrying transient failures.
    async fn fetch_page(&mut self, url: &str) -> GitHubResult<RestResponse> {
        let headers = self.headers()?;
        let body = self.body()?;
        let policy = self.ctx.retry_policy();
        let mut page_attempts = 0;
        let mut last: Option<Result<TransportResponse, GitHubError>> = None;
        let mut state = RetryState::Attempting { attempt: 1 };

        loop {
            state = match state {
                RetryState::Attempting { attempt } => {
                    self.check_cancelled()?;
                    self.check_rate_limit(page_attempts).await?;

                    self.ctx.progress().on_attempt(self.request.description(), attempt);
                    page_attempts = attempt;
                    self.attempts += 1;

                    let sent = self
                        .ctx
                        .transport()
                        .send(TransportRequest {
                            method: self.request.method().clone(),
                            url: url.to_string(),
                            headers: headers.clone(),
                            body: body.clone(),
                        })
                        .await;

                    let (outcome, result) = self.evaluate(sent).await;
                    last = Some(result);
                    policy.next_state(attempt, &outcome)
                }
                RetryState::Backoff { attempt, delay } => {
                    let delay = policy.with_jitter(delay);
                    if let Some(Err(ref e)) = last {
                        warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Retrying after error"
                        );
                    }
                    self.sleep(delay).await?;
                    RetryState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                RetryState::Succeeded => {
                    self.pages += 1;
                    return match last.take() {
                        Some(Ok(response)) => decode(response),
                        Some(Err(e)) => Err(e.with_attempts(page_attempts)),
                        None => Err(GitHubError::transport("No response recorded")),
                    };
                }
                RetryState::Failed => {
                    return Err(match last.take() {
                        Some(Err(e)) => e.with_attempts(page_attempts),
                        _ => GitHubError::transport("Request failed without a response"),
                    });
                }
            };
        }
    }

    /// Classifies one attempt and records any rate-limit counters it carried.
    async fn evaluate(
        &self,
        sent: GitHubResult<TransportResponse>,
    ) -> (AttemptOutcome, Result<TransportResponse, GitHubError>) {
        let response = match sent {
            Ok(response) => response,
            Err(e) => return (AttemptOutcome::Transient { retry_after: None }, Err(e)),
        };

        let rate_limit = extract_rate_limit(&response.headers).map(|mut info| {
            if info.resource.is_none() {
                info.resource = Some(resource_for_path(self.request.uri_fragment()).to_string());
            }
            info
        });
        if let Some(ref info) = rate_limit {
            if self.ctx.config().rate_limit.enabled {
                log_rate_limit_update(info);
                self.ctx
                    .rate_limits()
                    .update(&self.rate_key, info.clone())
                    .await;
            }
        }

        let class = classify(
            self.request.method(),
            response.status,
            &response.headers,
            &response.body,
        );

        match class {
            ResponseClass::Success => (AttemptOutcome::Success, Ok(response)),
            ResponseClass::NotReady => {
                let error = GitHubError::new(
                    GitHubErrorKind::RateLimited,
                    "Result is still being computed",
                )
                .with_status(response.status.as_u16());
                let error = match response.request_id() {
                    Some(id) => error.with_request_id(id),
                    None => error,
                };
                (
                    AttemptOutcome::Transient {
                        retry_after: retry_after(&response.headers),
                    },
                    Err(error),
                )
            }
            ResponseClass::SecondaryRateLimit => (
                AttemptOutcome::Transient {
                    retry_after: retry_after(&response.headers),
                },
                Err(response_error(GitHubErrorKind::RateLimited, &response, rate_limit)),
            ),
            ResponseClass::PrimaryRateLimit => {
                if let Some(ref info) = rate_limit {
                    log_rate_limit_exceeded(info);
                }
                (
                    AttemptOutcome::Terminal,
                    Err(response_error(GitHubErrorKind::RateLimited, &response, rate_limit)),
                )
            }
            ResponseClass::ClientError => (
                AttemptOutcome::Terminal,
                Err(response_error(GitHubErrorKind::ClientError, &response, rate_limit)),
            ),
            ResponseClass::ServerError => (
                AttemptOutcome::Transient { retry_after: None },
                Err(response_error(GitHubErrorKind::ServerError, &response, rate_limit)),
            ),
        }
    }

    async fn check_rate_limit(&self, attempts: u32) -> GitHubResult<()> {
        let limits = &self.ctx.config().rate_limit;
        if !limits.enabled || !limits.preemptive_fail_fast {
            return Ok(());
        }

        let resource = resource_for_path(self.request.uri_fragment());
        match self
            .ctx
            .rate_limits()
            .exhausted_at(&self.rate_key, resource, Utc::now())
            .await
        {
            Some(info) => {
                log_rate_limit_exceeded(&info);
                let message = format!(
                    "Rate limit exhausted until {}; request not sent",
                    info.reset_at
                );
                Err(GitHubError::new(GitHubErrorKind::RateLimited, message)
                    .with_rate_limit(info)
                    .with_attempts(attempts))
            }
            None => Ok(()),
        }
    }

    fn check_cancelled(&self) -> GitHubResult<()> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(GitHubError::cancelled("Call cancelled")),
            _ => Ok(()),
        }
    }

    async fn sleep(&self, delay: std::time::Duration) -> GitHubResult<()> {
        match self.cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Err(GitHubError::cancelled("Call cancelled during backoff")),
                _ = tokio::time::sleep(delay) => Ok(()),
            },
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }

    fn headers(&self) -> GitHubResult<HeaderMap> {
        let config = self.ctx.config();
        let mut headers = HeaderMap::new();

        if let Some(auth) = self.token.authorization_header() {
            let mut value = HeaderValue::from_str(&auth).map_err(|_| {
                GitHubError::invalid_parameter("Access token contains invalid header characters")
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        headers.insert(USER_AGENT, header_value(&config.user_agent)?);
        headers.insert(ACCEPT, header_value(&accept_header(self.request.accept()))?);
        headers.insert("x-github-api-version", header_value(&config.api_version)?);

        if self.request.body().is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(headers)
    }

    fn body(&self) -> GitHubResult<Option<Bytes>> {
        self.request
            .body()
            .map(|b| serde_json::to_vec(b).map(Bytes::from))
            .transpose()
            .map_err(|e| {
                GitHubError::invalid_parameter(format!("Failed to serialize request body: {}", e))
            })
    }

    /// Emits telemetry and the completion notification, then hands back the result.
    fn finish<T>(self, result: GitHubResult<T>) -> GitHubResult<T> {
        let ctx = self.ctx;
        let success = result.is_ok();

        ctx.progress().on_complete(self.request.description(), success);
        ctx.telemetry().record(&TelemetryEvent {
            name: self.request.telemetry_event(),
            call_id: self.call_id,
            properties: self.request.telemetry_properties().clone(),
            duration: self.started.elapsed(),
            success,
            error_kind: result.as_ref().err().map(GitHubError::kind),
            pages: self.pages,
            attempts: self.attempts,
        });

        result
    }
}

/// Joins the API root and a relative URI fragment.
pub fn build_url(base_url: &str, fragment: &str) -> GitHubResult<String> {
    if fragment.contains("://") {
        return Err(GitHubError::invalid_parameter(format!(
            "URI fragment must be relative to the API root: {}",
            fragment
        )));
    }

    let base = base_url.trim_end_matches('/');
    let path = fragment.trim_start_matches('/');
    Ok(format!("{}/{}", base, path))
}

/// Builds the Accept header: caller overrides first, then the default media type.
pub fn accept_header(overrides: &[String]) -> String {
    let default = crate::config::DEFAULT_ACCEPT;
    let mut values: Vec<&str> = overrides.iter().map(String::as_str).collect();
    if !values.contains(&default) {
        values.push(default);
    }
    values.join(", ")
}

fn ensure_same_origin(base_url: &str, link: &str) -> GitHubResult<()> {
    let base = Url::parse(base_url)
        .map_err(|e| GitHubError::configuration(format!("Invalid base URL: {}", e)))?;
    let next = Url::parse(link).map_err(|e| {
        GitHubError::invalid_parameter(format!("Invalid pagination link {}: {}", link, e))
    })?;

    if base.origin() == next.origin() {
        Ok(())
    } else {
        Err(GitHubError::invalid_parameter(format!(
            "Pagination link points outside the API root: {}",
            link
        )))
    }
}

fn header_value(value: &str) -> GitHubResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| GitHubError::configuration(format!("Invalid header value: {}", value)))
}

/// Decodes a successful response; an empty body decodes to `Value::Null`.
fn decode(response: TransportResponse) -> GitHubResult<RestResponse> {
    let links = PaginationLinks::from_headers(&response.headers);
    let rate_limit = extract_rate_limit(&response.headers);
    let request_id = response.request_id();
    let status = response.status.as_u16();

    let value = if response.body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&response.body).map_err(|e| {
            let error = GitHubError::deserialization(format!("Failed to deserialize response: {}", e))
                .with_status(status)
                .with_cause(e);
            match request_id.as_deref() {
                Some(id) => error.with_request_id(id),
                None => error,
            }
        })?
    };

    Ok(RestResponse {
        value,
        links,
        rate_limit,
        status,
        request_id,
    })
}

/// Builds a classified error from a non-success response.
fn response_error(
    kind: GitHubErrorKind,
    response: &TransportResponse,
    rate_limit: Option<RateLimitInfo>,
) -> GitHubError {
    let status = response.status;
    let payload = serde_json::from_slice::<Value>(&response.body).ok();

    let message = payload
        .as_ref()
        .and_then(|p| p.get("message"))
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| default_message(status));

    let mut error = GitHubError::new(kind, message).with_status(status.as_u16());

    if let Some(url) = payload
        .as_ref()
        .and_then(|p| p.get("documentation_url"))
        .and_then(Value::as_str)
    {
        error = error.with_documentation_url(url);
    }
    if let Some(id) = response.request_id() {
        error = error.with_request_id(id);
    }
    if let Some(info) = rate_limit {
        error = error.with_rate_limit(info);
    }
    if let Some(payload) = payload {
        error = error.with_payload(payload);
    }

    error
}

fn default_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("HTTP {} {}", status.as_u16(), reason),
        None => format!("HTTP {} error", status.as_u16()),
    }
}

/// Items contributed by one decoded page.
fn items_of(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
