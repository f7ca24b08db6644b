//! GitHub REST access: rate-limited client, commit listing, and detail fan-out.
//!
//! Every request goes through [`client::GitHubClient`], which classifies
//! failures into [`repopulse_core::PulseError`] variants, retries timeouts a
//! bounded number of times, and records the quota reported by each response.
//! HTTP itself sits behind the [`transport::Transport`] trait so tests can
//! script responses without a network.

pub mod client;
pub mod credentials;
pub mod details;
pub mod listing;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod repo_url;
pub mod transport;
mod wire;

pub use client::{ApiResponse, GitHubClient, RetryPolicy};
pub use credentials::{Anonymous, CredentialProvider, StaticToken};
pub use details::{fetch_details, DetailOptions};
pub use listing::{list_commits, CommitListing, ListingOptions};
pub use repo_url::{parse_repo_url, RepoRef};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
