//! Repository analysis pipeline.
//!
//! [`Analyzer::analyze`] validates its input, fetches the repository's
//! language totals and recent commit history, computes the team and commit
//! metrics, and always returns a fully formed
//! [`AnalysisResult`](repopulse_core::AnalysisResult).

pub mod pipeline;

pub use pipeline::{window_start, Analyzer, RATE_LIMIT_SUGGESTION};
