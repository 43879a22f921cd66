//! Retry policy and rate-limit tracking for the REST core.
//!
//! The decision half is pure: [`classify`] turns a response into a
//! [`ResponseClass`], and [`RetryPolicy::next_state`] turns
//! `(attempt, outcome)` into the next [`RetryState`]. Sleeping, jitter and
//! I/O live in the executor in `crate::invoke`.

use crate::config::RetryConfig;
use crate::errors::RateLimitInfo;
use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// Classification of one HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// 2xx, including `202` on non-GET requests.
    Success,
    /// `202` on a GET: the server is still computing the result.
    NotReady,
    /// Secondary rate limit or abuse detection.
    SecondaryRateLimit,
    /// The primary quota for the token is exhausted.
    PrimaryRateLimit,
    /// Any other 4xx.
    ClientError,
    /// 5xx or anything else unexpected.
    ServerError,
}

/// Classifies a response by method, status, headers and body.
pub fn classify(method: &Method, status: StatusCode, headers: &HeaderMap, body: &[u8]) -> ResponseClass {
    if status == StatusCode::ACCEPTED && *method == Method::GET {
        return ResponseClass::NotReady;
    }

    if status.is_success() {
        return ResponseClass::Success;
    }

    if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
        let remaining = headers
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok());

        if remaining == Some(0) {
            return ResponseClass::PrimaryRateLimit;
        }

        if headers.contains_key(RETRY_AFTER)
            || mentions_secondary_limit(body)
            || status == StatusCode::TOO_MANY_REQUESTS
        {
            return ResponseClass::SecondaryRateLimit;
        }

        return ResponseClass::ClientError;
    }

    if status.is_client_error() {
        ResponseClass::ClientError
    } else {
        ResponseClass::ServerError
    }
}

fn mentions_secondary_limit(body: &[u8]) -> bool {
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_ascii_lowercase))
        .unwrap_or_default();

    message.contains("secondary rate limit") || message.contains("abuse")
}

/// Outcome of a single attempt, as seen by the retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The attempt produced a usable response.
    Success,
    /// The failure may resolve on retry.
    Transient {
        /// Server-requested wait, if any.
        retry_after: Option<Duration>,
    },
    /// The failure will not resolve on retry.
    Terminal,
}

/// State of one page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// About to issue attempt number `attempt` (1-based).
    Attempting {
        /// Attempt number.
        attempt: u32,
    },
    /// Waiting before the next attempt.
    Backoff {
        /// Attempts made so far.
        attempt: u32,
        /// Base delay before jitter.
        delay: Duration,
    },
    /// The last attempt succeeded.
    Succeeded,
    /// No further attempts will be made.
    Failed,
}

/// Pure retry decision function.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
    jitter: f64,
}

impl RetryPolicy {
    /// Creates a new retry policy.
    pub fn new(
        max_attempts: u32,
        initial_backoff: Duration,
        max_backoff: Duration,
        multiplier: f64,
        jitter: f64,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
            multiplier,
            jitter,
        }
    }

    /// Creates a policy from retry configuration.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.effective_max_attempts(),
            config.initial_backoff,
            config.max_backoff,
            config.multiplier,
            config.jitter,
        )
    }

    /// Maximum attempts per page.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides what happens after `attempt` attempts ended in `outcome`.
    pub fn next_state(&self, attempt: u32, outcome: &AttemptOutcome) -> RetryState {
        match outcome {
            AttemptOutcome::Success => RetryState::Succeeded,
            AttemptOutcome::Terminal => RetryState::Failed,
            AttemptOutcome::Transient { .. } if attempt >= self.max_attempts => RetryState::Failed,
            AttemptOutcome::Transient { retry_after } => RetryState::Backoff {
                attempt,
                delay: retry_after
                    .map(|d| d.min(self.max_backoff))
                    .unwrap_or_else(|| self.calculate_backoff(attempt)),
            },
        }
    }

    /// Calculates backoff duration after an attempt.
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff.as_millis() as f64
            * self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let capped = base.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Spreads a delay by the configured jitter factor.
    pub fn with_jitter(&self, delay: Duration) -> Duration {
        if self.jitter <= 0.0 || delay.is_zero() {
            return delay;
        }

        let millis = delay.as_millis() as f64;
        let range = millis * self.jitter;
        let offset = rand::thread_rng().gen_range(-range..=range);
        Duration::from_millis((millis + offset).max(0.0) as u64)
    }
}

/// Extracts rate limit counters from response headers.
pub fn extract_rate_limit(headers: &HeaderMap) -> Option<RateLimitInfo> {
    fn header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }

    let limit = header(headers, "x-ratelimit-limit")?;
    let remaining = header(headers, "x-ratelimit-remaining")?;
    let reset_timestamp: i64 = header(headers, "x-ratelimit-reset")?;
    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo {
        limit,
        remaining,
        reset_at,
        retry_after: retry_after(headers).map(|d| d.as_secs()),
        resource: headers
            .get("x-ratelimit-resource")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    })
}

/// Reads a `Retry-After` header given in seconds.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Bucket assumed when a response carries no `X-RateLimit-Resource`.
pub const DEFAULT_RESOURCE: &str = "core";

/// Rate-limit bucket a request path draws from.
pub fn resource_for_path(uri_fragment: &str) -> &'static str {
    let path = uri_fragment
        .trim_start_matches('/')
        .split('?')
        .next()
        .unwrap_or_default();

    if path == "search/code" || path.starts_with("search/code/") {
        "code_search"
    } else if path.starts_with("search/") {
        "search"
    } else {
        DEFAULT_RESOURCE
    }
}

/// Last observed rate-limit counters per token and resource.
#[derive(Debug, Default)]
pub struct RateLimitTracker {
    entries: RwLock<HashMap<(String, String), RateLimitInfo>>,
}

impl RateLimitTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records counters observed for `key` under the resource they name.
    ///
    /// Within one reset window the lowest remaining count wins, so a stale
    /// response that arrives late cannot undo an observed exhaustion.
    pub async fn update(&self, key: &str, info: RateLimitInfo) {
        let resource = info
            .resource
            .clone()
            .unwrap_or_else(|| DEFAULT_RESOURCE.to_string());
        let mut entries = self.entries.write().await;
        match entries.get_mut(&(key.to_string(), resource.clone())) {
            Some(existing) if existing.reset_at == info.reset_at => {
                if info.remaining < existing.remaining {
                    *existing = info;
                }
            }
            Some(existing) if existing.reset_at > info.reset_at => {}
            _ => {
                entries.insert((key.to_string(), resource), info);
            }
        }
    }

    /// Gets the last observed counters for `key` in `resource`.
    pub async fn get(&self, key: &str, resource: &str) -> Option<RateLimitInfo> {
        self.entries
            .read()
            .await
            .get(&(key.to_string(), resource.to_string()))
            .cloned()
    }

    /// Returns the counters for `key` in `resource` if that quota is exhausted at `now`.
    pub async fn exhausted_at(
        &self,
        key: &str,
        resource: &str,
        now: DateTime<Utc>,
    ) -> Option<RateLimitInfo> {
        self.get(key, resource)
            .await
            .filter(|info| info.is_exhausted_at(now))
    }

    /// Forgets every resource's counters for `key`.
    pub async fn clear(&self, key: &str) {
        self.entries.write().await.retain(|(k, _), _| k != key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use test_case::test_case;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(
            3,
            Duration::from_secs(1),
            Duration::from_secs(60),
            2.0,
            0.0, // No jitter for predictable test
        )
    }

    fn rate_headers(remaining: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("5000"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_str(remaining).unwrap());
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1700000000"));
        headers
    }

    #[test_case(Method::GET, 200, ResponseClass::Success ; "get ok")]
    #[test_case(Method::GET, 202, ResponseClass::NotReady ; "get accepted is not ready")]
    #[test_case(Method::POST, 202, ResponseClass::Success ; "post accepted is success")]
    #[test_case(Method::DELETE, 204, ResponseClass::Success ; "no content")]
    #[test_case(Method::GET, 404, ResponseClass::ClientError ; "not found")]
    #[test_case(Method::POST, 422, ResponseClass::ClientError ; "validation")]
    #[test_case(Method::GET, 403, ResponseClass::ClientError ; "plain forbidden")]
    #[test_case(Method::GET, 429, ResponseClass::SecondaryRateLimit ; "too many requests")]
    #[test_case(Method::GET, 500, ResponseClass::ServerError ; "internal error")]
    #[test_case(Method::GET, 503, ResponseClass::ServerError ; "unavailable")]
    fn test_classify_status(method: Method, status: u16, expected: ResponseClass) {
        let status = StatusCode::from_u16(status).unwrap();
        assert_eq!(classify(&method, status, &HeaderMap::new(), b""), expected);
    }

    #[test]
    fn test_classify_primary_rate_limit() {
        let class = classify(&Method::GET, StatusCode::FORBIDDEN, &rate_headers("0"), b"{}");
        assert_eq!(class, ResponseClass::PrimaryRateLimit);
    }

    #[test]
    fn test_classify_secondary_rate_limit() {
        let body = br#"{"message":"You have exceeded a secondary rate limit."}"#;
        let class = classify(&Method::GET, StatusCode::FORBIDDEN, &rate_headers("12"), body);
        assert_eq!(class, ResponseClass::SecondaryRateLimit);

        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));
        let class = classify(&Method::POST, StatusCode::FORBIDDEN, &headers, b"");
        assert_eq!(class, ResponseClass::SecondaryRateLimit);
    }

    #[test]
    fn test_retry_backoff_calculation() {
        let policy = policy();

        assert_eq!(policy.calculate_backoff(1), Duration::from_secs(1));
        assert_eq!(policy.calculate_backoff(2), Duration::from_secs(2));
        assert_eq!(policy.calculate_backoff(3), Duration::from_secs(4));
        assert_eq!(policy.calculate_backoff(10), Duration::from_secs(60));
    }

    #[test]
    fn test_state_transitions() {
        let policy = policy();
        let transient = AttemptOutcome::Transient { retry_after: None };

        assert_eq!(policy.next_state(1, &AttemptOutcome::Success), RetryState::Succeeded);
        assert_eq!(policy.next_state(1, &AttemptOutcome::Terminal), RetryState::Failed);
        assert_eq!(
            policy.next_state(1, &transient),
            RetryState::Backoff {
                attempt: 1,
                delay: Duration::from_secs(1)
            }
        );
        assert_eq!(
            policy.next_state(2, &transient),
            RetryState::Backoff {
                attempt: 2,
                delay: Duration::from_secs(2)
            }
        );
        assert_eq!(policy.next_state(3, &transient), RetryState::Failed);
    }

    #[test]
    fn test_retry_after_is_capped() {
        let policy = policy();
        let outcome = AttemptOutcome::Transient {
            retry_after: Some(Duration::from_secs(600)),
        };
        assert_eq!(
            policy.next_state(1, &outcome),
            RetryState::Backoff {
                attempt: 1,
                delay: Duration::from_secs(60)
            }
        );
    }

    #[test]
    fn test_single_attempt_policy_never_backs_off() {
        let policy = RetryPolicy::new(1, Duration::ZERO, Duration::ZERO, 1.0, 0.0);
        let transient = AttemptOutcome::Transient { retry_after: None };
        assert_eq!(policy.next_state(1, &transient), RetryState::Failed);
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(60), 2.0, 0.1);
        for _ in 0..50 {
            let delay = policy.with_jitter(Duration::from_millis(1000));
            assert!(delay >= Duration::from_millis(900));
            assert!(delay <= Duration::from_millis(1100));
        }
    }

    #[test]
    fn test_extract_rate_limit() {
        let mut headers = rate_headers("42");
        headers.insert("x-ratelimit-resource", HeaderValue::from_static("core"));
        let info = extract_rate_limit(&headers).unwrap();

        assert_eq!(info.limit, 5000);
        assert_eq!(info.remaining, 42);
        assert_eq!(info.reset_at.timestamp(), 1_700_000_000);
        assert_eq!(info.resource.as_deref(), Some("core"));
        assert!(extract_rate_limit(&HeaderMap::new()).is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_tracker() {
        let tracker = RateLimitTracker::new();
        let now = Utc::now();
        let reset_at = now + chrono::Duration::hours(1);

        let info = |remaining| RateLimitInfo {
            limit: 5000,
            remaining,
            reset_at,
            retry_after: None,
            resource: Some("core".to_string()),
        };

        tracker.update("token-a", info(100)).await;
        assert!(tracker.exhausted_at("token-a", "core", now).await.is_none());

        tracker.update("token-a", info(0)).await;
        assert!(tracker.exhausted_at("token-a", "core", now).await.is_some());
        assert!(tracker.exhausted_at("token-b", "core", now).await.is_none());

        // A late response from the same window does not raise the count again.
        tracker.update("token-a", info(7)).await;
        assert_eq!(tracker.get("token-a", "core").await.unwrap().remaining, 0);

        // Once the window has passed the quota is usable again.
        assert!(tracker
            .exhausted_at("token-a", "core", reset_at + chrono::Duration::seconds(1))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_new_window_replaces_old() {
        let tracker = RateLimitTracker::new();
        let now = Utc::now();

        tracker
            .update(
                "k",
                RateLimitInfo {
                    limit: 60,
                    remaining: 0,
                    reset_at: now,
                    retry_after: None,
                    resource: None,
                },
            )
            .await;
        tracker
            .update(
                "k",
                RateLimitInfo {
                    limit: 60,
                    remaining: 59,
                    reset_at: now + chrono::Duration::hours(1),
                    retry_after: None,
                    resource: None,
                },
            )
            .await;

        assert_eq!(tracker.get("k", "core").await.unwrap().remaining, 59);
        tracker.clear("k").await;
        assert!(tracker.get("k", "core").await.is_none());
    }

    #[tokio::test]
    async fn test_resources_are_tracked_separately() {
        let tracker = RateLimitTracker::new();
        let now = Utc::now();
        let info = |resource: &str, limit, remaining, minutes| RateLimitInfo {
            limit,
            remaining,
            reset_at: now + chrono::Duration::minutes(minutes),
            retry_after: None,
            resource: Some(resource.to_string()),
        };

        tracker.update("k", info("core", 5000, 4999, 60)).await;
        // An earlier reset in another bucket must not be dropped.
        tracker.update("k", info("search", 30, 0, 1)).await;

        assert!(tracker.exhausted_at("k", "search", now).await.is_some());
        assert!(tracker.exhausted_at("k", "core", now).await.is_none());
        assert_eq!(tracker.get("k", "core").await.unwrap().remaining, 4999);

        tracker.clear("k").await;
        assert!(tracker.get("k", "search").await.is_none());
    }

    #[test_case("user", "core")]
    #[test_case("/repos/o/r/issues?page=2", "core")]
    #[test_case("search/issues?q=bug", "search")]
    #[test_case("/search/code", "code_search")]
    #[test_case("searches/x", "core")]
    fn test_resource_for_path(fragment: &str, expected: &str) {
        assert_eq!(resource_for_path(fragment), expected);
    }
}
