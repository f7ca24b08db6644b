use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PulseError;

/// Top-level configuration loaded from `.repopulse.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
/// Environment variables are only consulted by the binary; library code
/// receives a fully resolved value.
///
/// # Examples
///
/// ```
/// use repopulse_core::PulseConfig;
///
/// let config = PulseConfig::default();
/// assert_eq!(config.analysis.window_days, 90);
/// assert_eq!(config.fetch.concurrency, 5);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseConfig {
    /// GitHub API access settings.
    #[serde(default)]
    pub github: GitHubConfig,
    /// Pagination and fan-out pacing.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Default analysis window.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl PulseConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Io`] if the file cannot be read, or
    /// [`PulseError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use repopulse_core::PulseConfig;
    /// use std::path::Path;
    ///
    /// let config = PulseConfig::from_file(Path::new(".repopulse.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, PulseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use repopulse_core::PulseConfig;
    ///
    /// let toml = r#"
    /// [fetch]
    /// concurrency = 3
    /// "#;
    /// let config = PulseConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.fetch.concurrency, 3);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PulseError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Reject tunables that would stall or disable fetching.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), PulseError> {
        if self.github.max_attempts == 0 {
            return Err(PulseError::Config("github.max_attempts must be at least 1".into()));
        }
        if self.fetch.concurrency == 0 {
            return Err(PulseError::Config("fetch.concurrency must be at least 1".into()));
        }
        if self.fetch.batch_size == 0 {
            return Err(PulseError::Config("fetch.batch_size must be at least 1".into()));
        }
        if self.analysis.max_commits == 0 {
            return Err(PulseError::Config("analysis.max_commits must be at least 1".into()));
        }
        Ok(())
    }
}

/// GitHub API access configuration.
///
/// # Examples
///
/// ```
/// use repopulse_core::GitHubConfig;
///
/// let config = GitHubConfig::default();
/// assert_eq!(config.api_base, "https://api.github.com");
/// assert_eq!(config.max_attempts, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Base URL for REST calls (default: `https://api.github.com`).
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Personal access token. `None` means unauthenticated access.
    pub token: Option<String>,
    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// TCP/TLS connect timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Per-read timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Whole-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Attempts per request when timeouts occur (default: 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay between timeout retries in milliseconds (default: 2000).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Delay after a TLS handshake failure in milliseconds (default: 3000).
    #[serde(default = "default_handshake_retry_delay_ms")]
    pub handshake_retry_delay_ms: u64,
}

fn default_api_base() -> String {
    "https://api.github.com".into()
}

fn default_user_agent() -> String {
    concat!("repopulse/", env!("CARGO_PKG_VERSION")).into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_handshake_retry_delay_ms() -> u64 {
    3000
}

impl GitHubConfig {
    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Read timeout as a [`Duration`].
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Whole-request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token: None,
            user_agent: default_user_agent(),
            connect_timeout_secs: default_timeout_secs(),
            read_timeout_secs: default_timeout_secs(),
            request_timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            handshake_retry_delay_ms: default_handshake_retry_delay_ms(),
        }
    }
}

/// Pacing for commit listing and detail fan-out.
///
/// The delays keep request bursts below GitHub's secondary abuse-detection
/// thresholds, which apply independently of the documented quota.
///
/// # Examples
///
/// ```
/// use repopulse_core::FetchConfig;
///
/// let config = FetchConfig::default();
/// assert_eq!(config.batch_size, 10);
/// assert_eq!(config.batch_delay_ms, 500);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Delay between commit-listing pages in milliseconds (default: 100).
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    /// Maximum simultaneous commit-detail requests (default: 5).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Commits per detail batch (default: 10).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Delay between detail batches in milliseconds (default: 500).
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    /// Delay taken inside the admission gate before each detail request (default: 100).
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

fn default_page_delay_ms() -> u64 {
    100
}

fn default_concurrency() -> usize {
    5
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_delay_ms() -> u64 {
    500
}

fn default_request_delay_ms() -> u64 {
    100
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: default_page_delay_ms(),
            concurrency: default_concurrency(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

/// Default analysis window used when the caller does not override it.
///
/// # Examples
///
/// ```
/// use repopulse_core::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.max_commits, 500);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Look-back window in days (default: 90).
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Maximum commits to inspect (default: 500).
    #[serde(default = "default_max_commits")]
    pub max_commits: usize,
}

fn default_window_days() -> u32 {
    90
}

fn default_max_commits() -> usize {
    500
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            max_commits: default_max_commits(),
        }
    }
}
