//! Access tokens and token resolution for the GitHub REST API.

use crate::errors::{GitHubError, GitHubResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

/// Rate-limit key used for unauthenticated calls.
pub const ANONYMOUS_KEY: &str = "anonymous";

/// Credentials attached to a request.
#[derive(Debug, Clone)]
pub enum AccessToken {
    /// Token sent as `Authorization: Bearer <token>`.
    Bearer(SecretString),
    /// Username and password (or token) sent as `Authorization: Basic`.
    Basic {
        /// Username.
        username: String,
        /// Password or personal access token.
        password: SecretString,
    },
}

impl AccessToken {
    /// Creates a bearer token.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(SecretString::new(token.into()))
    }

    /// Creates basic credentials.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }

    /// Generates the Authorization header value.
    pub fn authorization_header(&self) -> String {
        match self {
            Self::Bearer(token) => format!("Bearer {}", token.expose_secret()),
            Self::Basic { username, password } => {
                let raw = format!("{}:{}", username, password.expose_secret());
                format!("Basic {}", STANDARD.encode(raw))
            }
        }
    }

    /// Stable, non-reversible key identifying this credential.
    ///
    /// Rate-limit counters are tracked per key, so two handles holding the
    /// same secret share one quota.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.authorization_header().as_bytes());
        hex::encode(&digest[..8])
    }

    /// Gets the token prefix for logging.
    pub fn token_prefix(&self) -> &'static str {
        match self {
            Self::Bearer(t) => {
                let exposed = t.expose_secret();
                if exposed.starts_with("ghp_") {
                    "ghp_***"
                } else if exposed.starts_with("github_pat_") {
                    "github_pat_***"
                } else if exposed.starts_with("gho_") {
                    "gho_***"
                } else if exposed.starts_with("ghs_") {
                    "ghs_***"
                } else {
                    "***"
                }
            }
            Self::Basic { .. } => "basic",
        }
    }
}

/// Where the token used for a logical call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Passed on the request descriptor.
    Explicit,
    /// The context default (session or configured).
    Default,
    /// No token; the call is unauthenticated.
    Anonymous,
}

/// A token resolved once per logical call.
#[derive(Debug, Clone)]
pub struct ResolvedToken {
    /// The token, if any.
    pub token: Option<AccessToken>,
    /// Where it came from.
    pub source: TokenSource,
}

impl ResolvedToken {
    /// Key under which rate-limit counters for this token are tracked.
    pub fn rate_limit_key(&self) -> String {
        self.token
            .as_ref()
            .map(AccessToken::fingerprint)
            .unwrap_or_else(|| ANONYMOUS_KEY.to_string())
    }

    /// Authorization header value, if authenticated.
    pub fn authorization_header(&self) -> Option<String> {
        self.token.as_ref().map(AccessToken::authorization_header)
    }
}

/// Resolves the token for a call: explicit override, then default, then none.
pub fn resolve_token(
    explicit: Option<&AccessToken>,
    default: Option<&AccessToken>,
) -> ResolvedToken {
    match (explicit, default) {
        (Some(token), _) => ResolvedToken {
            token: Some(token.clone()),
            source: TokenSource::Explicit,
        },
        (None, Some(token)) => ResolvedToken {
            token: Some(token.clone()),
            source: TokenSource::Default,
        },
        (None, None) => ResolvedToken {
            token: None,
            source: TokenSource::Anonymous,
        },
    }
}

/// Credential provider trait for dynamic credential resolution.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Gets the current access token.
    async fn access_token(&self) -> GitHubResult<AccessToken>;

    /// Checks if credentials are available.
    async fn is_valid(&self) -> bool;
}

/// Static credential provider using a fixed token.
pub struct StaticCredentialProvider {
    token: AccessToken,
}

impl StaticCredentialProvider {
    /// Creates a new static credential provider.
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn access_token(&self) -> GitHubResult<AccessToken> {
        Ok(self.token.clone())
    }

    async fn is_valid(&self) -> bool {
        true
    }
}

/// Environment variable credential provider.
pub struct EnvCredentialProvider {
    token_var: String,
}

impl EnvCredentialProvider {
    /// Creates a provider from the GITHUB_TOKEN environment variable.
    pub fn from_github_token() -> Self {
        Self {
            token_var: "GITHUB_TOKEN".to_string(),
        }
    }

    /// Creates a provider from a custom environment variable.
    pub fn from_env_var(var_name: impl Into<String>) -> Self {
        Self {
            token_var: var_name.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn access_token(&self) -> GitHubResult<AccessToken> {
        match std::env::var(&self.token_var) {
            Ok(value) if !value.trim().is_empty() => Ok(AccessToken::bearer(value.trim())),
            _ => Err(GitHubError::configuration(format!(
                "Environment variable {} not set",
                self.token_var
            ))),
        }
    }

    async fn is_valid(&self) -> bool {
        std::env::var(&self.token_var)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header() {
        let token = AccessToken::bearer("ghp_test");
        assert_eq!(token.authorization_header(), "Bearer ghp_test");
        assert_eq!(token.token_prefix(), "ghp_***");
    }

    #[test]
    fn test_basic_header() {
        let token = AccessToken::basic("octocat", "secret");
        assert_eq!(token.authorization_header(), "Basic b2N0b2NhdDpzZWNyZXQ=");
    }

    #[test]
    fn test_debug_hides_secret() {
        let token = AccessToken::bearer("ghp_supersecret");
        assert!(!format!("{:?}", token).contains("supersecret"));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = AccessToken::bearer("one");
        let b = AccessToken::bearer("one");
        let c = AccessToken::bearer("two");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
    }

    #[test]
    fn test_resolution_precedence() {
        let explicit = AccessToken::bearer("explicit");
        let default = AccessToken::bearer("default");

        let resolved = resolve_token(Some(&explicit), Some(&default));
        assert_eq!(resolved.source, TokenSource::Explicit);
        assert_eq!(
            resolved.authorization_header().as_deref(),
            Some("Bearer explicit")
        );

        let resolved = resolve_token(None, Some(&default));
        assert_eq!(resolved.source, TokenSource::Default);
        assert_eq!(
            resolved.authorization_header().as_deref(),
            Some("Bearer default")
        );

        let resolved = resolve_token(None, None);
        assert_eq!(resolved.source, TokenSource::Anonymous);
        assert!(resolved.authorization_header().is_none());
        assert_eq!(resolved.rate_limit_key(), ANONYMOUS_KEY);
    }

    #[tokio::test]
    async fn test_static_credential_provider() {
        let provider = StaticCredentialProvider::new(AccessToken::bearer("test"));
        assert!(provider.is_valid().await);
        let token = provider.access_token().await.unwrap();
        assert_eq!(token.authorization_header(), "Bearer test");
    }

    #[tokio::test]
    async fn test_env_provider_missing_var() {
        let provider = EnvCredentialProvider::from_env_var("GITHUB_REST_TEST_UNSET_TOKEN_VAR");
        assert!(!provider.is_valid().await);
        assert!(provider.access_token().await.is_err());
    }
}
