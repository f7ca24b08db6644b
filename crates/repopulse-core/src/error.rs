use serde::{Deserialize, Serialize};

/// Errors that can occur while mining and analyzing a repository.
///
/// Library crates return this type directly. The analysis pipeline converts
/// it into a structured [`AnalysisFailure`](crate::AnalysisFailure) so that
/// no typed error crosses the public `analyze` boundary.
///
/// # Examples
///
/// ```
/// use repopulse_core::{FailureKind, PulseError};
///
/// let err = PulseError::RateLimitExceeded { reset_epoch: 1_700_000_000 };
/// assert_eq!(err.kind(), FailureKind::RateLimitExceeded);
/// assert!(err.to_string().contains("1700000000"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Caller input rejected before any network request was made.
    #[error("validation error: {0}")]
    Validation(String),

    /// The API quota is exhausted until `reset_epoch` (unix seconds).
    #[error("rate limit exceeded, resets at {reset_epoch}")]
    RateLimitExceeded {
        /// Unix timestamp at which the quota resets.
        reset_epoch: i64,
    },

    /// The requested resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Timeouts persisted through every retry attempt.
    #[error("transient network error after {attempts} attempts: {message}")]
    TransientNetwork {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Description of the last failure.
        message: String,
    },

    /// Any other non-2xx response.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// Non-retryable transport failure (DNS, refused connection, bad request).
    #[error("network error: {0}")]
    Network(String),

    /// The credential provider could not produce an authorization header.
    #[error("credential error: {0}")]
    Credentials(String),
}

impl PulseError {
    /// Machine-readable classification of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            PulseError::Validation(_) => FailureKind::Validation,
            PulseError::RateLimitExceeded { .. } => FailureKind::RateLimitExceeded,
            PulseError::NotFound(_) => FailureKind::NotFound,
            PulseError::TransientNetwork { .. } => FailureKind::TransientNetwork,
            PulseError::Api { .. } => FailureKind::ApiError,
            PulseError::Network(_) => FailureKind::Network,
            PulseError::Io(_)
            | PulseError::Config(_)
            | PulseError::Serialization(_)
            | PulseError::Toml(_)
            | PulseError::Credentials(_) => FailureKind::Unexpected,
        }
    }
}

/// Machine-readable failure classification exposed on analysis results.
///
/// # Examples
///
/// ```
/// use repopulse_core::FailureKind;
///
/// let json = serde_json::to_string(&FailureKind::RateLimitExceeded).unwrap();
/// assert_eq!(json, "\"rate_limit_exceeded\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed input such as a repository URL.
    Validation,
    /// API quota exhausted.
    RateLimitExceeded,
    /// Repository or commit does not exist.
    NotFound,
    /// Timeouts outlasted the retry budget.
    TransientNetwork,
    /// Other non-2xx API response.
    ApiError,
    /// Non-retryable transport failure.
    Network,
    /// Anything else, including panics inside the pipeline.
    Unexpected,
}
