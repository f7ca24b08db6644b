//! Authorization header providers.
//!
//! Token acquisition and refresh live outside this crate. The client asks its
//! provider for headers once per request attempt and treats them as opaque.

use std::sync::Arc;

use repopulse_core::{GitHubConfig, PulseError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

/// Produces authorization headers for outgoing requests.
#[async_trait::async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Headers to merge into the next request.
    async fn auth_headers(&self) -> Result<HeaderMap, PulseError>;
}

/// Sends no credentials. GitHub allows 60 requests per hour this way.
pub struct Anonymous;

#[async_trait::async_trait]
impl CredentialProvider for Anonymous {
    async fn auth_headers(&self) -> Result<HeaderMap, PulseError> {
        Ok(HeaderMap::new())
    }
}

/// A fixed bearer token, such as a personal access token.
///
/// # Examples
///
/// ```
/// use repopulse_github::StaticToken;
///
/// let provider = StaticToken::new("ghp_xxxx");
/// ```
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    /// Wrap `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait::async_trait]
impl CredentialProvider for StaticToken {
    async fn auth_headers(&self) -> Result<HeaderMap, PulseError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| {
                PulseError::Credentials("token contains invalid header characters".into())
            })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}

/// Pick a provider from the resolved configuration: a token if one is set,
/// otherwise anonymous access.
pub fn from_config(config: &GitHubConfig) -> Arc<dyn CredentialProvider> {
    match config.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => Arc::new(StaticToken::new(token)),
        _ => Arc::new(Anonymous),
    }
}
