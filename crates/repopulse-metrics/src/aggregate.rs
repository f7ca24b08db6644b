use repopulse_core::{AuthorNetLines, CommitDetail, CommitMetrics, TeamMetrics};

use crate::compartment::summarize;
use crate::contribution::{gini, net_contributions, top_contributors_share};
use crate::language::per_author_language;

/// Team and commit metrics computed from one set of commit details.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    /// Contribution inequality and language attribution.
    pub team: TeamMetrics,
    /// Commit count and compartmentalization.
    pub commits: CommitMetrics,
}

/// Compute every metric over `details`.
///
/// `contributions` is ordered by net lines descending, ties broken by author
/// key; `per_author_language` is ordered by author key. An empty input yields
/// the defaults.
///
/// # Examples
///
/// ```
/// use repopulse_metrics::aggregate;
///
/// let metrics = aggregate(&[]);
/// assert_eq!(metrics.commits.count, 0);
/// assert_eq!(metrics.commits.mean_compartmentalization, 1.0);
/// assert_eq!(metrics.team.gini_contribution, 0.0);
/// ```
pub fn aggregate(details: &[CommitDetail]) -> Aggregate {
    let ledger = net_contributions(details);
    let totals: Vec<i64> = ledger.values().copied().collect();

    let mut contributions: Vec<AuthorNetLines> = ledger
        .into_iter()
        .map(|(author, net_lines)| AuthorNetLines { author, net_lines })
        .collect();
    contributions.sort_by(|a, b| {
        b.net_lines
            .cmp(&a.net_lines)
            .then_with(|| a.author.cmp(&b.author))
    });

    let compartments = summarize(details);

    Aggregate {
        team: TeamMetrics {
            gini_contribution: gini(&totals),
            top_contributors_share: top_contributors_share(&totals),
            contributions,
            per_author_language: per_author_language(details),
        },
        commits: CommitMetrics {
            count: details.len(),
            median_compartmentalization: compartments.median,
            mean_compartmentalization: compartments.mean,
        },
    }
}
