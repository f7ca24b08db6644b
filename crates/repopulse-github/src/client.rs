use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use repopulse_core::{CommitDetail, CommitSummary, GitHubConfig, PulseError, RateLimitInfo};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::credentials::CredentialProvider;
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
use crate::wire::{CommitPayload, ListedCommit};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Quota assumed when GitHub omits `x-ratelimit-limit` (the unauthenticated limit).
const DEFAULT_RATE_LIMIT: u64 = 60;

/// Bounded retry schedule for timeouts.
///
/// # Examples
///
/// ```
/// use repopulse_github::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts, 3);
/// assert_eq!(policy.delay, Duration::from_secs(2));
/// assert_eq!(policy.handshake_delay, Duration::from_secs(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
    /// Fixed wait after a timeout.
    pub delay: Duration,
    /// Fixed wait after a TLS handshake failure.
    pub handshake_delay: Duration,
}

impl RetryPolicy {
    /// Build the policy from `[github]` settings.
    pub fn from_config(config: &GitHubConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_millis(config.retry_delay_ms),
            handshake_delay: Duration::from_millis(config.handshake_retry_delay_ms),
        }
    }

    fn delay_for(&self, err: &TransportError) -> Duration {
        match err {
            TransportError::Handshake(_) => self.handshake_delay,
            _ => self.delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&GitHubConfig::default())
    }
}

/// A successful (2xx) API response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Quota reported alongside this response.
    pub rate_limit: RateLimitInfo,
    /// Raw body text.
    pub body: String,
}

impl ApiResponse {
    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Serialization`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, PulseError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Rate-limit-aware GitHub REST client.
///
/// Classifies every response: 2xx succeeds, 403 mentioning a rate limit
/// becomes [`PulseError::RateLimitExceeded`], 404 becomes
/// [`PulseError::NotFound`], anything else non-2xx becomes
/// [`PulseError::Api`]. None of those are retried. Timeouts are retried per
/// [`RetryPolicy`] and surface as [`PulseError::TransientNetwork`] once the
/// attempts run out.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use repopulse_core::GitHubConfig;
/// use repopulse_github::{Anonymous, GitHubClient};
///
/// let client = GitHubClient::new(&GitHubConfig::default(), Arc::new(Anonymous)).unwrap();
/// assert!(client.rate_limit().is_none());
/// ```
pub struct GitHubClient {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
    retry: RetryPolicy,
    api_base: String,
    last_rate_limit: Mutex<Option<RateLimitInfo>>,
}

impl GitHubClient {
    /// Create a client that talks to GitHub over HTTPS.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Config`] if the HTTP client cannot be built.
    pub fn new(
        config: &GitHubConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, PulseError> {
        let transport = Arc::new(ReqwestTransport::new(config)?);
        Ok(Self::with_transport(config, transport, credentials))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(
        config: &GitHubConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            transport,
            credentials,
            retry: RetryPolicy::from_config(config),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            last_rate_limit: Mutex::new(None),
        }
    }

    /// Quota reported by the most recent response, success or failure.
    pub fn rate_limit(&self) -> Option<RateLimitInfo> {
        self.last_rate_limit
            .lock()
            .map(|slot| *slot)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }

    /// URL of `tail` under `/repos/{owner}/{repo}`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use repopulse_core::GitHubConfig;
    /// use repopulse_github::{Anonymous, GitHubClient};
    ///
    /// let client = GitHubClient::new(&GitHubConfig::default(), Arc::new(Anonymous)).unwrap();
    /// assert_eq!(
    ///     client.repo_url("octocat", "hello-world", "/languages"),
    ///     "https://api.github.com/repos/octocat/hello-world/languages"
    /// );
    /// ```
    pub fn repo_url(&self, owner: &str, repo: &str, tail: &str) -> String {
        format!("{}/repos/{owner}/{repo}{tail}", self.api_base)
    }

    /// Issue an authenticated GET with retry and failure classification.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::RateLimitExceeded`], [`PulseError::NotFound`],
    /// [`PulseError::Api`], [`PulseError::TransientNetwork`],
    /// [`PulseError::Network`], or [`PulseError::Credentials`].
    pub async fn issue(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<ApiResponse, PulseError> {
        let query: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let mut headers: HeaderMap = self.credentials.auth_headers().await?;
            headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));

            let request = HttpRequest {
                url: url.to_string(),
                query: query.clone(),
                headers,
            };

            match self.transport.get(request).await {
                Ok(response) => return self.classify(url, response),
                Err(err) if !err.is_retryable() => {
                    return Err(PulseError::Network(format!("GET {url}: {err}")));
                }
                Err(err) if attempt >= self.retry.max_attempts => {
                    warn!(
                        url,
                        attempts = attempt,
                        error = %err,
                        "giving up after repeated timeouts"
                    );
                    return Err(PulseError::TransientNetwork {
                        attempts: attempt,
                        message: err.to_string(),
                    });
                }
                Err(err) => {
                    let delay = self.retry.delay_for(&err);
                    warn!(
                        url,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// GET `url` and deserialize the JSON body.
    ///
    /// # Errors
    ///
    /// Same as [`GitHubClient::issue`], plus [`PulseError::Serialization`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, PulseError> {
        self.issue(url, params).await?.json()
    }

    /// Bytes of code per language.
    ///
    /// # Errors
    ///
    /// See [`GitHubClient::issue`].
    pub async fn repo_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<BTreeMap<String, u64>, PulseError> {
        self.get_json(&self.repo_url(owner, repo, "/languages"), &[])
            .await
    }

    /// One page of the commit listing, newest first.
    ///
    /// # Errors
    ///
    /// See [`GitHubClient::issue`].
    pub async fn commits_page(
        &self,
        owner: &str,
        repo: &str,
        since: &str,
        per_page: usize,
        page: u32,
    ) -> Result<Vec<CommitSummary>, PulseError> {
        let params = [
            ("since", since.to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ];
        let listed: Vec<ListedCommit> = self
            .get_json(&self.repo_url(owner, repo, "/commits"), &params)
            .await?;
        Ok(listed.into_iter().map(CommitSummary::from).collect())
    }

    /// Diff statistics for a single commit.
    ///
    /// # Errors
    ///
    /// See [`GitHubClient::issue`].
    pub async fn commit_detail(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<CommitDetail, PulseError> {
        let payload: CommitPayload = self
            .get_json(&self.repo_url(owner, repo, &format!("/commits/{sha}")), &[])
            .await?;
        Ok(CommitDetail::from(payload))
    }

    fn classify(&self, url: &str, response: HttpResponse) -> Result<ApiResponse, PulseError> {
        let rate_limit = parse_rate_limit(&response.headers);
        self.record_rate_limit(rate_limit);
        debug!(
            url,
            status = response.status,
            remaining = rate_limit.remaining,
            "GitHub response"
        );

        match response.status {
            200..=299 => Ok(ApiResponse {
                status: response.status,
                rate_limit,
                body: response.body,
            }),
            403 if mentions_rate_limit(&response.body) => Err(PulseError::RateLimitExceeded {
                reset_epoch: rate_limit.reset_epoch,
            }),
            404 => Err(PulseError::NotFound(url.to_string())),
            status => Err(PulseError::Api {
                status,
                message: body_excerpt(&response.body),
            }),
        }
    }

    fn record_rate_limit(&self, info: RateLimitInfo) {
        match self.last_rate_limit.lock() {
            Ok(mut slot) => *slot = Some(info),
            Err(poisoned) => *poisoned.into_inner() = Some(info),
        }
    }
}

/// Read `x-ratelimit-*` headers, defaulting any that are missing or malformed.
///
/// # Examples
///
/// ```
/// use repopulse_github::client::parse_rate_limit;
/// use reqwest::header::{HeaderMap, HeaderValue};
///
/// let mut headers = HeaderMap::new();
/// headers.insert("x-ratelimit-remaining", HeaderValue::from_static("42"));
/// let info = parse_rate_limit(&headers);
/// assert_eq!(info.remaining, 42);
/// assert_eq!(info.limit, 60);
/// ```
pub fn parse_rate_limit(headers: &HeaderMap) -> RateLimitInfo {
    fn header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
        headers.get(name)?.to_str().ok()?.trim().parse().ok()
    }

    RateLimitInfo {
        remaining: header(headers, "x-ratelimit-remaining").unwrap_or(0),
        reset_epoch: header(headers, "x-ratelimit-reset").unwrap_or(0),
        limit: header(headers, "x-ratelimit-limit").unwrap_or(DEFAULT_RATE_LIMIT),
    }
}

fn mentions_rate_limit(body: &str) -> bool {
    body.to_lowercase().contains("rate limit")
}

fn body_excerpt(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX_CHARS).collect();
        format!("{cut}...")
    }
}
