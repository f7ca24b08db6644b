//! Team and change-shape metrics over fetched commit details.
//!
//! Everything here is a pure function of its inputs: net-line inequality
//! (Gini coefficient and top-contributor share), per-commit
//! compartmentalization, and per-author language attribution.
//! [`aggregate::aggregate`] combines them into the shapes reported by
//! [`repopulse_core::AnalysisResult`].

pub mod aggregate;
pub mod author;
pub mod compartment;
pub mod contribution;
pub mod language;

pub use aggregate::{aggregate, Aggregate};
pub use author::{author_key, UNKNOWN_AUTHOR};
pub use compartment::{compartmentalization, summarize, CompartmentSummary};
pub use contribution::{gini, net_contributions, top_contributors_share, TOP_CONTRIBUTORS};
pub use language::{language_for_path, per_author_language};
