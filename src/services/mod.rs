//! GitHub API endpoint services.
//!
//! Each service builds request descriptors and hands them to the REST core
//! through [`crate::client::GitHubClient`].

mod repositories;
mod issues;
mod labels;
mod pull_requests;
mod teams;
mod users;
mod organizations;
mod rate_limit;

pub use repositories::*;
pub use issues::*;
pub use labels::*;
pub use pull_requests::*;
pub use teams::*;
pub use users::*;
pub use organizations::*;
pub use rate_limit::*;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// Characters left as-is in a path segment.
const SEGMENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encodes one path segment (label names may contain spaces or `/`).
pub(crate) fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT_SET).to_string()
}
