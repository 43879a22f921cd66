//! Observability: telemetry events, progress reporting, metrics and log redaction.

use crate::errors::{GitHubErrorKind, RateLimitInfo};
use reqwest::header::HeaderMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Summary of one logical call, emitted once it finishes.
#[derive(Debug, Clone)]
pub struct TelemetryEvent {
    /// Event name.
    pub name: String,
    /// Correlation id of the logical call.
    pub call_id: String,
    /// Caller-supplied properties.
    pub properties: BTreeMap<String, String>,
    /// Wall time of the logical call.
    pub duration: Duration,
    /// Whether the call succeeded.
    pub success: bool,
    /// Error kind, when the call failed.
    pub error_kind: Option<GitHubErrorKind>,
    /// Pages fetched.
    pub pages: u32,
    /// HTTP attempts made across all pages.
    pub attempts: u32,
}

/// Receives one event per logical call.
pub trait TelemetrySink: Send + Sync {
    /// Records a finished logical call.
    fn record(&self, event: &TelemetryEvent);
}

/// Telemetry sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn record(&self, _event: &TelemetryEvent) {}
}

/// Telemetry sink that writes events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn record(&self, event: &TelemetryEvent) {
        if event.success {
            info!(
                event = %event.name,
                call_id = %event.call_id,
                duration_ms = event.duration.as_millis() as u64,
                pages = event.pages,
                attempts = event.attempts,
                "GitHub API call completed"
            );
        } else {
            warn!(
                event = %event.name,
                call_id = %event.call_id,
                duration_ms = event.duration.as_millis() as u64,
                error_kind = %event.error_kind.map(|k| k.to_string()).unwrap_or_default(),
                attempts = event.attempts,
                "GitHub API call failed"
            );
        }
    }
}

/// Metrics collector fed by telemetry events.
#[derive(Debug, Default)]
pub struct MetricsTelemetry {
    /// Logical calls recorded.
    calls_total: AtomicU64,
    /// Successful calls.
    calls_success: AtomicU64,
    /// Failed calls.
    calls_failed: AtomicU64,
    /// Calls that failed because of rate limiting.
    calls_rate_limited: AtomicU64,
    /// Pages fetched.
    pages_total: AtomicU64,
    /// HTTP attempts made.
    attempts_total: AtomicU64,
    /// Total call latency in microseconds.
    latency_total_us: AtomicU64,
}

impl MetricsTelemetry {
    /// Creates a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let calls_total = self.calls_total.load(Ordering::Relaxed);
        let latency = self.latency_total_us.load(Ordering::Relaxed);
        MetricsSnapshot {
            calls_total,
            calls_success: self.calls_success.load(Ordering::Relaxed),
            calls_failed: self.calls_failed.load(Ordering::Relaxed),
            calls_rate_limited: self.calls_rate_limited.load(Ordering::Relaxed),
            pages_total: self.pages_total.load(Ordering::Relaxed),
            attempts_total: self.attempts_total.load(Ordering::Relaxed),
            average_latency_us: if calls_total == 0 { 0 } else { latency / calls_total },
        }
    }

    /// Resets all metrics.
    pub fn reset(&self) {
        self.calls_total.store(0, Ordering::Relaxed);
        self.calls_success.store(0, Ordering::Relaxed);
        self.calls_failed.store(0, Ordering::Relaxed);
        self.calls_rate_limited.store(0, Ordering::Relaxed);
        self.pages_total.store(0, Ordering::Relaxed);
        self.attempts_total.store(0, Ordering::Relaxed);
        self.latency_total_us.store(0, Ordering::Relaxed);
    }
}

impl TelemetrySink for MetricsTelemetry {
    fn record(&self, event: &TelemetryEvent) {
        self.calls_total.fetch_add(1, Ordering::Relaxed);
        if event.success {
            self.calls_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.calls_failed.fetch_add(1, Ordering::Relaxed);
        }
        if event.error_kind == Some(GitHubErrorKind::RateLimited) {
            self.calls_rate_limited.fetch_add(1, Ordering::Relaxed);
        }
        self.pages_total.fetch_add(u64::from(event.pages), Ordering::Relaxed);
        self.attempts_total.fetch_add(u64::from(event.attempts), Ordering::Relaxed);
        self.latency_total_us
            .fetch_add(event.duration.as_micros() as u64, Ordering::Relaxed);
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Logical calls.
    pub calls_total: u64,
    /// Successful calls.
    pub calls_success: u64,
    /// Failed calls.
    pub calls_failed: u64,
    /// Rate-limited calls.
    pub calls_rate_limited: u64,
    /// Pages fetched.
    pub pages_total: u64,
    /// HTTP attempts.
    pub attempts_total: u64,
    /// Average latency in microseconds.
    pub average_latency_us: u64,
}

/// Receives status updates while a logical call runs.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressReporter: Send + Sync {
    /// An HTTP attempt is about to be issued.
    fn on_attempt(&self, description: &str, attempt: u32);

    /// A page of a multi-page call arrived.
    fn on_page(&self, description: &str, page: u32, items_so_far: usize);

    /// The logical call finished.
    fn on_complete(&self, description: &str, success: bool);
}

/// Progress reporter that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn on_attempt(&self, _description: &str, _attempt: u32) {}

    fn on_page(&self, _description: &str, _page: u32, _items_so_far: usize) {}

    fn on_complete(&self, _description: &str, _success: bool) {}
}

/// Progress reporter that writes to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn on_attempt(&self, description: &str, attempt: u32) {
        if attempt > 1 {
            info!(description = %description, attempt, "Retrying");
        } else {
            debug!(description = %description, "Started");
        }
    }

    fn on_page(&self, description: &str, page: u32, items_so_far: usize) {
        info!(description = %description, page, items_so_far, "Fetched page");
    }

    fn on_complete(&self, description: &str, success: bool) {
        debug!(description = %description, success, "Finished");
    }
}

/// Logs a rate limit update.
pub fn log_rate_limit_update(info: &RateLimitInfo) {
    debug!(
        limit = info.limit,
        remaining = info.remaining,
        reset_at = %info.reset_at,
        resource = info.resource.as_deref().unwrap_or("core"),
        "Rate limit updated"
    );
}

/// Logs an exhausted rate limit.
pub fn log_rate_limit_exceeded(info: &RateLimitInfo) {
    warn!(
        limit = info.limit,
        remaining = info.remaining,
        reset_at = %info.reset_at,
        resource = info.resource.as_deref().unwrap_or("core"),
        "Rate limit exceeded"
    );
}

/// Sensitive headers that should be redacted in logs.
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "x-github-token",
    "x-access-token",
    "cookie",
    "set-cookie",
];

/// Redacts sensitive values in headers.
pub fn redact_header(name: &str, value: &str) -> String {
    if SENSITIVE_HEADERS.contains(&name.to_lowercase().as_str()) {
        "[REDACTED]".to_string()
    } else {
        value.to_string()
    }
}

/// Header pairs safe to log, sensitive values replaced.
pub fn redacted_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or("<non-ascii>");
            (name.as_str().to_string(), redact_header(name.as_str(), value))
        })
        .collect()
}
