//! # GitHub REST Integration Library
//!
//! A GitHub REST API client built around one invocation core:
//! - Single-result, multi-page and first-page calls over `Link` pagination
//! - Bounded retry with exponential backoff for 5xx, transport failures and
//!   secondary rate limits; 4xx fail after one attempt
//! - Per-token rate-limit tracking with pre-emptive fail fast
//! - Token precedence: explicit override, then session default, then anonymous
//! - Cancellation, call timeouts, telemetry and progress reporting
//! - Thin typed services for issues, labels, pull requests, repositories,
//!   teams, users and organizations
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use integrations_github_rest::{GitHubClient, GitHubConfig, AccessToken};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GitHubConfig::builder()
//!         .token(AccessToken::bearer("ghp_xxxxxxxxxxxx"))
//!         .build()?;
//!
//!     let client = GitHubClient::new(config)?;
//!
//!     // Every page is fetched and concatenated
//!     let issues = client.issues().list("octocat", "hello-world").await?;
//!     for issue in issues {
//!         println!("#{} {}", issue.number, issue.title);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Raw calls
//!
//! ```rust,no_run
//! use integrations_github_rest::{invoke_multiple, InvocationContext, GitHubConfig, RequestDescriptor};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = InvocationContext::new(GitHubConfig::builder().from_env().build()?)?;
//! let request = RequestDescriptor::get("repos/rust-lang/rust/labels")
//!     .description("Getting labels")
//!     .build();
//! let labels = invoke_multiple(&ctx, &request).await?;
//! println!("{} labels", labels.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod types;

// Authentication
pub mod auth;

// Request descriptors and the invocation core
pub mod context;
pub mod invoke;
pub mod request;

// HTTP transport
pub mod transport;

// Typed client
pub mod client;

// Pagination handling
pub mod pagination;

// API Services
pub mod services;

// Retry policy and rate-limit tracking
pub mod resilience;

// Observability
pub mod observability;

// Mocks for testing
pub mod mocks;

// Re-exports for convenience
pub use auth::{AccessToken, CredentialProvider, EnvCredentialProvider, StaticCredentialProvider};
pub use client::{GitHubClient, GitHubClientBuilder};
pub use config::{GitHubConfig, GitHubConfigBuilder};
pub use context::{InvocationContext, InvocationContextBuilder};
pub use errors::{GitHubError, GitHubErrorKind, GitHubResult};
pub use invoke::{
    invoke, invoke_extended, invoke_first_page, invoke_multiple, invoke_single,
    invoke_with_cancellation, RestResponse, RestResult,
};
pub use pagination::{Page, PaginationLinks, PaginationParams};
pub use request::{CallMode, RequestDescriptor, RequestDescriptorBuilder};
pub use transport::{HttpTransport, ReqwestTransport};
pub use types::*;
