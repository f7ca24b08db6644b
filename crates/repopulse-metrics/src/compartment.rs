//! Compartmentalization: how confined a commit's changes are.
//!
//! Files are grouped by top-level directory and weighted by lines changed.
//! A commit touching a single group scores 1.0; one spread evenly over `k`
//! groups scores 0.0 (normalized Shannon entropy, inverted).

use std::collections::BTreeMap;

use repopulse_core::{CommitDetail, FileStat};

/// Group name for files at the repository root.
pub const ROOT_GROUP: &str = "(root)";

/// Top-level path segment of `path`, or [`ROOT_GROUP`] for root files.
///
/// # Examples
///
/// ```
/// use repopulse_metrics::compartment::top_level_group;
///
/// assert_eq!(top_level_group("src/lib.rs"), "src");
/// assert_eq!(top_level_group("README.md"), "(root)");
/// ```
pub fn top_level_group(path: &str) -> &str {
    match path.split_once('/') {
        Some((head, _)) => head,
        None => ROOT_GROUP,
    }
}

/// Score in `[0, 1]` for one commit's files. No files, or one group, is 1.0.
///
/// # Examples
///
/// ```
/// use repopulse_core::FileStat;
/// use repopulse_metrics::compartmentalization;
///
/// let file = |name: &str| FileStat { filename: name.into(), additions: 5, deletions: 5 };
/// assert_eq!(compartmentalization(&[file("api/a.rs"), file("api/b.rs")]), 1.0);
/// assert!(compartmentalization(&[file("api/a.rs"), file("web/b.ts")]).abs() < 1e-12);
/// ```
pub fn compartmentalization(files: &[FileStat]) -> f64 {
    let mut groups: BTreeMap<&str, u64> = BTreeMap::new();
    for file in files {
        *groups.entry(top_level_group(&file.filename)).or_default() += file.change_weight();
    }
    if groups.len() <= 1 {
        return 1.0;
    }

    let total: u64 = groups.values().sum();
    let entropy: f64 = groups
        .values()
        .map(|weight| {
            let p = *weight as f64 / total as f64;
            -p * p.ln()
        })
        .sum();
    let max_entropy = (groups.len() as f64).ln();

    (1.0 - entropy / max_entropy).clamp(0.0, 1.0)
}

/// Median and mean compartmentalization across commits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompartmentSummary {
    /// Middle score; mean of the two middle scores for even counts.
    pub median: f64,
    /// Arithmetic mean score.
    pub mean: f64,
}

impl Default for CompartmentSummary {
    fn default() -> Self {
        Self {
            median: 1.0,
            mean: 1.0,
        }
    }
}

/// Summarize scores over commits that carry at least one file entry.
///
/// Commits without file data are skipped; if none remain both values are 1.0.
pub fn summarize(details: &[CommitDetail]) -> CompartmentSummary {
    let mut scores: Vec<f64> = details
        .iter()
        .filter(|d| !d.files.is_empty())
        .map(|d| compartmentalization(&d.files))
        .collect();
    if scores.is_empty() {
        return CompartmentSummary::default();
    }
    scores.sort_by(f64::total_cmp);

    let n = scores.len();
    let median = if n % 2 == 1 {
        scores[n / 2]
    } else {
        (scores[n / 2 - 1] + scores[n / 2]) / 2.0
    };
    let mean = scores.iter().sum::<f64>() / n as f64;

    CompartmentSummary { median, mean }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repopulse_core::CommitStats;

    fn file(name: &str, additions: u64, deletions: u64) -> FileStat {
        FileStat {
            filename: name.into(),
            additions,
            deletions,
        }
    }

    fn commit(files: Vec<FileStat>) -> CommitDetail {
        CommitDetail {
            sha: "abc".into(),
            author_login: Some("alice".into()),
            author_email: None,
            stats: CommitStats::default(),
            files,
        }
    }

    #[test]
    fn single_file_is_fully_compartmentalized() {
        assert_eq!(compartmentalization(&[file("src/main.rs", 40, 2)]), 1.0);
    }

    #[test]
    fn empty_commit_is_fully_compartmentalized() {
        assert_eq!(compartmentalization(&[]), 1.0);
    }

    #[test]
    fn two_even_groups_score_zero() {
        let score = compartmentalization(&[file("api/x.go", 3, 3), file("web/y.ts", 6, 0)]);
        assert!(score.abs() < 1e-12, "score {score}");
    }

    #[test]
    fn root_files_form_their_own_group() {
        let score = compartmentalization(&[file("Cargo.toml", 1, 1), file("src/lib.rs", 1, 1)]);
        assert!(score.abs() < 1e-12, "score {score}");
        assert_eq!(
            compartmentalization(&[file("Cargo.toml", 1, 0), file("README.md", 9, 0)]),
            1.0
        );
    }

    #[test]
    fn uneven_spread_is_between_bounds() {
        let score = compartmentalization(&[file("core/a.rs", 90, 0), file("docs/b.md", 10, 0)]);
        assert!(score > 0.0 && score < 1.0, "score {score}");
    }

    #[test]
    fn zero_line_changes_still_count() {
        // renames weigh 1 each
        let score = compartmentalization(&[file("a/x", 0, 0), file("b/y", 0, 0)]);
        assert!(score.abs() < 1e-12, "score {score}");
    }

    #[test]
    fn summary_defaults_when_no_file_data() {
        let summary = summarize(&[commit(vec![]), commit(vec![])]);
        assert_eq!(summary, CompartmentSummary::default());
        assert_eq!(summarize(&[]), CompartmentSummary::default());
    }

    #[test]
    fn even_count_median_averages_middle_scores() {
        let details = vec![
            commit(vec![file("a/x", 1, 0)]),
            commit(vec![file("a/x", 1, 0), file("b/y", 1, 0)]),
            commit(vec![]),
        ];
        let summary = summarize(&details);
        assert!((summary.median - 0.5).abs() < 1e-12);
        assert!((summary.mean - 0.5).abs() < 1e-12);
    }

    #[test]
    fn odd_count_median_is_middle_score() {
        let details = vec![
            commit(vec![file("a/x", 1, 0)]),
            commit(vec![file("a/x", 1, 0)]),
            commit(vec![file("a/x", 1, 0), file("b/y", 1, 0)]),
        ];
        let summary = summarize(&details);
        assert_eq!(summary.median, 1.0);
        assert!((summary.mean - 2.0 / 3.0).abs() < 1e-12);
    }
}
