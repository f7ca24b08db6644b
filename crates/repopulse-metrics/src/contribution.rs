//! Net-line contribution ledger and inequality measures.
//!
//! The ledger keeps signed totals so authors whose work is mostly deletion
//! show up with negative numbers. The inequality measures clamp those totals
//! at zero before computing anything.

use std::collections::BTreeMap;

use repopulse_core::CommitDetail;

use crate::author::author_key;

/// Number of authors counted by [`top_contributors_share`].
pub const TOP_CONTRIBUTORS: usize = 3;

/// Signed `additions - deletions` per author key.
///
/// # Examples
///
/// ```
/// use repopulse_core::{CommitDetail, CommitStats};
/// use repopulse_metrics::net_contributions;
///
/// let commit = |login: &str, additions, deletions| CommitDetail {
///     sha: "abc".into(),
///     author_login: Some(login.into()),
///     author_email: None,
///     stats: CommitStats { additions, deletions },
///     files: vec![],
/// };
/// let history = [commit("alice", 10, 2), commit("bob", 1, 9), commit("alice", 5, 0)];
/// let ledger = net_contributions(&history);
/// assert_eq!(ledger["alice"], 13);
/// assert_eq!(ledger["bob"], -8);
/// ```
pub fn net_contributions(details: &[CommitDetail]) -> BTreeMap<String, i64> {
    let mut ledger: BTreeMap<String, i64> = BTreeMap::new();
    for detail in details {
        *ledger.entry(author_key(detail).to_string()).or_default() += detail.stats.net_lines();
    }
    ledger
}

/// Gini coefficient of `values` after clamping negatives to zero.
///
/// Zeros are discarded; an empty remainder yields 0. For the `n` remaining
/// values sorted ascending with sum `S`, let `W` be the sum of the running
/// cumulative sums. The result is `(n + 1 - 2W/S) / n`, which lies in
/// `[0, 1)` and is 0 when every value is equal.
///
/// # Examples
///
/// ```
/// use repopulse_metrics::gini;
///
/// assert_eq!(gini(&[10, 10, 10]), 0.0);
/// assert!((gini(&[1, 2, 3, 4]) - 0.25).abs() < 1e-12);
/// ```
pub fn gini(values: &[i64]) -> f64 {
    let mut positive: Vec<f64> = values
        .iter()
        .filter(|v| **v > 0)
        .map(|v| *v as f64)
        .collect();
    if positive.is_empty() {
        return 0.0;
    }
    positive.sort_by(f64::total_cmp);

    let n = positive.len() as f64;
    let total: f64 = positive.iter().sum();
    let mut cumulative = 0.0;
    let mut weighted = 0.0;
    for value in &positive {
        cumulative += value;
        weighted += cumulative;
    }

    (n + 1.0 - 2.0 * weighted / total) / n
}

/// Share of the clamped total held by the [`TOP_CONTRIBUTORS`] largest values.
///
/// Returns 0 when the clamped total is 0.
///
/// # Examples
///
/// ```
/// use repopulse_metrics::top_contributors_share;
///
/// assert_eq!(top_contributors_share(&[5, 5, 5, 5]), 0.75);
/// assert_eq!(top_contributors_share(&[-3, 0]), 0.0);
/// ```
pub fn top_contributors_share(values: &[i64]) -> f64 {
    let mut clamped: Vec<i64> = values.iter().map(|v| (*v).max(0)).collect();
    let total: i64 = clamped.iter().sum();
    if total == 0 {
        return 0.0;
    }
    clamped.sort_unstable_by(|a, b| b.cmp(a));
    let top: i64 = clamped.iter().take(TOP_CONTRIBUTORS).sum();
    top as f64 / total as f64
}
