//! Core types, configuration, and error handling for repopulse.
//!
//! This crate provides the shared foundation used by all other repopulse crates:
//! - [`PulseError`]: unified error type using `thiserror`
//! - [`PulseConfig`]: configuration loaded from `.repopulse.toml`
//! - Shared types: [`CommitSummary`], [`CommitDetail`], [`RateLimitInfo`],
//!   [`AnalysisResult`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{AnalysisConfig, FetchConfig, GitHubConfig, PulseConfig};
pub use error::{FailureKind, PulseError};
pub use types::{
    AnalysisFailure, AnalysisLimits, AnalysisResult, AuthorLanguages, AuthorNetLines,
    CommitDetail, CommitMetrics, CommitStats, CommitSummary, FileStat, OutputFormat,
    RateLimitInfo, TeamMetrics,
};

/// A convenience `Result` type for repopulse operations.
pub type Result<T> = std::result::Result<T, PulseError>;
