//! HTTP transport seam.
//!
//! [`ReqwestTransport`] is the production implementation; tests use
//! `MockTransport` from the `mock` module (behind the `test-util` feature).

use repopulse_core::{GitHubConfig, PulseError};
use reqwest::header::HeaderMap;

/// A GET request ready to be sent.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Absolute URL without query string.
    pub url: String,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// Request headers, including authorization.
    pub headers: HeaderMap,
}

impl HttpRequest {
    /// Value of the first query parameter named `name`.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A fully read response. Non-2xx statuses are not errors at this layer.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body as text.
    pub body: String,
}

/// Failure to obtain any response at all.
///
/// # Examples
///
/// ```
/// use repopulse_github::TransportError;
///
/// assert!(TransportError::Timeout("read timed out".into()).is_retryable());
/// assert!(!TransportError::Other("dns error".into()).is_retryable());
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Connect, read, write, or pool timeout.
    #[error("timed out: {0}")]
    Timeout(String),
    /// TLS handshake did not complete.
    #[error("TLS handshake failed: {0}")]
    Handshake(String),
    /// Anything else: DNS, refused connection, malformed request.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Whether the retry policy applies to this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Timeout(_) | TransportError::Handshake(_))
    }
}

/// Sends GET requests.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and read the whole body.
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with the timeouts and user agent from `config`.
    ///
    /// The whole-request timeout also bounds time spent writing the request
    /// and waiting for a pooled connection.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Config`] if the HTTP client cannot be built.
    ///
    /// # Examples
    ///
    /// ```
    /// use repopulse_core::GitHubConfig;
    /// use repopulse_github::ReqwestTransport;
    ///
    /// let transport = ReqwestTransport::new(&GitHubConfig::default()).unwrap();
    /// ```
    pub fn new(config: &GitHubConfig) -> Result<Self, PulseError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| PulseError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(&request.url)
            .query(&request.query)
            .headers(request.headers)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(classify)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    let detail = error_chain(&err);
    if err.is_timeout() {
        TransportError::Timeout(detail)
    } else if err.is_connect() && looks_like_handshake(&detail) {
        TransportError::Handshake(detail)
    } else {
        TransportError::Other(detail)
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

fn looks_like_handshake(detail: &str) -> bool {
    let detail = detail.to_lowercase();
    ["handshake", "tls", "certificate"]
        .iter()
        .any(|needle| detail.contains(needle))
}
