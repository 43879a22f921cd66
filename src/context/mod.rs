//! Shared state for REST invocations.
//!
//! Every core operation takes an [`InvocationContext`] explicitly. It owns the
//! configuration, the session default token and the per-token rate-limit
//! counters; the mutable parts sit behind `tokio::sync::RwLock` so concurrent
//! logical calls never lose an update.

use crate::auth::{resolve_token, AccessToken, CredentialProvider, ResolvedToken};
use crate::config::GitHubConfig;
use crate::errors::GitHubResult;
use crate::observability::{
    NoopProgress, NoopTelemetry, ProgressReporter, TelemetrySink, TracingProgress, TracingTelemetry,
};
use crate::resilience::{RateLimitTracker, RetryPolicy};
use crate::transport::{HttpTransport, ReqwestTransport};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Configuration plus synchronized state shared by all logical calls.
pub struct InvocationContext {
    config: GitHubConfig,
    retry_policy: RetryPolicy,
    default_token: RwLock<Option<AccessToken>>,
    rate_limits: RateLimitTracker,
    transport: Arc<dyn HttpTransport>,
    telemetry: Arc<dyn TelemetrySink>,
    progress: Arc<dyn ProgressReporter>,
}

impl InvocationContext {
    /// Creates a context with the default `reqwest` transport.
    pub fn new(config: GitHubConfig) -> GitHubResult<Self> {
        Self::builder(config).build()
    }

    /// Starts a context builder.
    pub fn builder(config: GitHubConfig) -> InvocationContextBuilder {
        InvocationContextBuilder::new(config)
    }

    /// Gets the configuration.
    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// Gets the retry policy derived from the configuration.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Gets the rate-limit tracker.
    pub fn rate_limits(&self) -> &RateLimitTracker {
        &self.rate_limits
    }

    pub(crate) fn transport(&self) -> &dyn HttpTransport {
        self.transport.as_ref()
    }

    pub(crate) fn telemetry(&self) -> &dyn TelemetrySink {
        self.telemetry.as_ref()
    }

    pub(crate) fn progress(&self) -> &dyn ProgressReporter {
        self.progress.as_ref()
    }

    /// Resolves the token for a call: explicit override, then session default.
    pub async fn resolve_token(&self, explicit: Option<&AccessToken>) -> ResolvedToken {
        let default = self.default_token.read().await;
        resolve_token(explicit, default.as_ref())
    }

    /// Replaces the session default token.
    pub async fn set_default_token(&self, token: AccessToken) {
        info!(token = token.token_prefix(), "Default access token set");
        *self.default_token.write().await = Some(token);
    }

    /// Removes the session default token; later calls run unauthenticated.
    pub async fn clear_default_token(&self) {
        info!("Default access token cleared");
        *self.default_token.write().await = None;
    }

    /// Seeds the session default token from a credential provider.
    pub async fn authenticate_with(&self, provider: &dyn CredentialProvider) -> GitHubResult<()> {
        let token = provider.access_token().await?;
        self.set_default_token(token).await;
        Ok(())
    }

    /// Returns true if a default token is configured.
    pub async fn is_authentication_configured(&self) -> bool {
        self.default_token.read().await.is_some()
    }
}

/// Builder for [`InvocationContext`].
pub struct InvocationContextBuilder {
    config: GitHubConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
    progress: Option<Arc<dyn ProgressReporter>>,
}

impl InvocationContextBuilder {
    /// Creates a new builder.
    pub fn new(config: GitHubConfig) -> Self {
        Self {
            config,
            transport: None,
            telemetry: None,
            progress: None,
        }
    }

    /// Uses a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Uses a custom telemetry sink.
    pub fn telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Uses a custom progress reporter.
    pub fn progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Builds the context.
    pub fn build(self) -> GitHubResult<InvocationContext> {
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.config)?),
        };

        let telemetry: Arc<dyn TelemetrySink> = if !self.config.telemetry.enabled {
            Arc::new(NoopTelemetry)
        } else {
            self.telemetry.unwrap_or_else(|| Arc::new(TracingTelemetry))
        };

        let progress: Arc<dyn ProgressReporter> = if !self.config.progress.enabled {
            Arc::new(NoopProgress)
        } else {
            self.progress.unwrap_or_else(|| Arc::new(TracingProgress))
        };

        Ok(InvocationContext {
            retry_policy: RetryPolicy::from_config(&self.config.retry),
            default_token: RwLock::new(self.config.token.clone()),
            rate_limits: RateLimitTracker::new(),
            config: self.config,
            transport,
            telemetry,
            progress,
        })
    }
}
