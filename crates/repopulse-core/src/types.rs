use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FailureKind;

/// API quota observed on the most recent response.
///
/// # Examples
///
/// ```
/// use repopulse_core::RateLimitInfo;
///
/// let info = RateLimitInfo { remaining: 0, reset_epoch: 1_700_000_000, limit: 60 };
/// assert!(info.is_exhausted());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    /// Requests left in the current window.
    pub remaining: u64,
    /// Unix timestamp at which the window resets.
    pub reset_epoch: i64,
    /// Total requests allowed per window.
    pub limit: u64,
}

impl RateLimitInfo {
    /// Whether no requests remain in the current window.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// A commit as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    /// Full commit SHA.
    pub sha: String,
    /// GitHub login of the author, when the commit is linked to an account.
    pub author_login: Option<String>,
}

/// Diff statistics for a single commit.
///
/// # Examples
///
/// ```
/// use repopulse_core::{CommitDetail, CommitStats};
///
/// let detail = CommitDetail {
///     sha: "abc123".into(),
///     author_login: Some("alice".into()),
///     author_email: Some("alice@example.com".into()),
///     stats: CommitStats { additions: 10, deletions: 25 },
///     files: vec![],
/// };
/// assert_eq!(detail.stats.net_lines(), -15);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitDetail {
    /// Full commit SHA.
    pub sha: String,
    /// GitHub login of the author, if linked.
    pub author_login: Option<String>,
    /// Email recorded in the commit's author signature.
    pub author_email: Option<String>,
    /// Totals across all files.
    pub stats: CommitStats,
    /// Per-file changes. May be empty for merge commits.
    pub files: Vec<FileStat>,
}

/// Line totals for a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    /// Lines added.
    pub additions: u64,
    /// Lines removed.
    pub deletions: u64,
}

impl CommitStats {
    /// `additions - deletions`, negative for net removals.
    pub fn net_lines(&self) -> i64 {
        self.additions as i64 - self.deletions as i64
    }
}

/// Line counts for one file touched by a commit.
///
/// # Examples
///
/// ```
/// use repopulse_core::FileStat;
///
/// let rename = FileStat { filename: "src/old.rs".into(), additions: 0, deletions: 0 };
/// assert_eq!(rename.change_weight(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// Path relative to the repository root.
    pub filename: String,
    /// Lines added.
    pub additions: u64,
    /// Lines removed.
    pub deletions: u64,
}

impl FileStat {
    /// `additions + deletions`, floored at 1 so renames and mode changes still count.
    pub fn change_weight(&self) -> u64 {
        (self.additions + self.deletions).max(1)
    }
}

/// Complete output of one repository analysis.
///
/// Always fully formed: failures are reported through [`AnalysisResult::error`]
/// with default metrics rather than through a typed error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// `owner/repo`, or the raw input when it could not be parsed.
    pub repo: String,
    /// Window and cap that bounded the inspection.
    pub limits: AnalysisLimits,
    /// Bytes of code per language as reported by GitHub.
    pub languages: BTreeMap<String, u64>,
    /// Team-level contribution signals.
    pub team: TeamMetrics,
    /// Commit-shape signals.
    pub commits: CommitMetrics,
    /// Set when the analysis failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AnalysisFailure>,
    /// Non-fatal note about the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Remediation hint accompanying some errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl AnalysisResult {
    /// A result with default metrics for `repo` within `limits`.
    ///
    /// # Examples
    ///
    /// ```
    /// use repopulse_core::{AnalysisLimits, AnalysisResult};
    ///
    /// let limits = AnalysisLimits {
    ///     since: "2024-01-01T00:00:00Z".into(),
    ///     max_commits: 500,
    ///     truncated: false,
    /// };
    /// let result = AnalysisResult::empty("octocat/hello-world", limits);
    /// assert_eq!(result.commits.count, 0);
    /// assert_eq!(result.commits.median_compartmentalization, 1.0);
    /// assert!(!result.is_error());
    /// ```
    pub fn empty(repo: impl Into<String>, limits: AnalysisLimits) -> Self {
        Self {
            repo: repo.into(),
            limits,
            languages: BTreeMap::new(),
            team: TeamMetrics::default(),
            commits: CommitMetrics::default(),
            error: None,
            warning: None,
            suggestion: None,
        }
    }

    /// Whether the analysis failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Bounds applied to the commit history walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisLimits {
    /// RFC 3339 lower bound of the window.
    pub since: String,
    /// Commit cap requested by the caller.
    pub max_commits: usize,
    /// `true` when the cap was reached, so older commits may exist in the window.
    pub truncated: bool,
}

/// Team-level contribution metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMetrics {
    /// Gini coefficient over clamped net-line totals (0 = equal).
    pub gini_contribution: f64,
    /// Share of clamped net lines held by the top three authors.
    pub top_contributors_share: f64,
    /// Signed net lines per author, unclamped.
    pub contributions: Vec<AuthorNetLines>,
    /// Change weight per language per author.
    pub per_author_language: Vec<AuthorLanguages>,
}

/// Signed net-line total for one author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorNetLines {
    /// Author key (login, email, or `"unknown"`).
    pub author: String,
    /// `additions - deletions` across analyzed commits.
    pub net_lines: i64,
}

/// Language attribution for one author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorLanguages {
    /// Author key.
    pub author: String,
    /// Language name → accumulated change weight.
    pub languages: BTreeMap<String, u64>,
}

/// Commit-shape metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitMetrics {
    /// Number of commits analyzed.
    pub count: usize,
    /// Median compartmentalization over commits with file data.
    pub median_compartmentalization: f64,
    /// Mean compartmentalization over commits with file data.
    pub mean_compartmentalization: f64,
}

impl Default for CommitMetrics {
    fn default() -> Self {
        Self {
            count: 0,
            median_compartmentalization: 1.0,
            mean_compartmentalization: 1.0,
        }
    }
}

/// Structured description of a failed analysis.
///
/// # Examples
///
/// ```
/// use repopulse_core::{AnalysisFailure, FailureKind};
///
/// let failure = AnalysisFailure {
///     kind: FailureKind::NotFound,
///     message: "not found: octocat/missing".into(),
///     status: Some(404),
///     reset_epoch: None,
/// };
/// let json = serde_json::to_value(&failure).unwrap();
/// assert_eq!(json["kind"], "not_found");
/// assert!(json.get("resetEpoch").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFailure {
    /// Machine-readable classification.
    pub kind: FailureKind,
    /// Human-readable description.
    pub message: String,
    /// HTTP status, when the failure came from a response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Quota reset time for rate-limit failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_epoch: Option<i64>,
}

/// Output format for rendering analysis results.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use repopulse_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repository: {}", self.repo)?;
        writeln!(
            f,
            "Window: since {} | cap {}{}",
            self.limits.since,
            self.limits.max_commits,
            if self.limits.truncated { " (truncated)" } else { "" }
        )?;

        if let Some(err) = &self.error {
            writeln!(f, "Error: {}", err.message)?;
            if let Some(hint) = &self.suggestion {
                writeln!(f, "Hint: {hint}")?;
            }
            return Ok(());
        }
        if let Some(warning) = &self.warning {
            writeln!(f, "Warning: {warning}")?;
        }

        if !self.languages.is_empty() {
            let total: u64 = self.languages.values().sum();
            writeln!(f, "\nLanguages")?;
            let mut langs: Vec<_> = self.languages.iter().collect();
            langs.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (name, bytes) in langs {
                let pct = if total > 0 {
                    *bytes as f64 * 100.0 / total as f64
                } else {
                    0.0
                };
                writeln!(f, "  {name:<20} {pct:>5.1}%")?;
            }
        }

        writeln!(f, "\nTeam")?;
        writeln!(f, "  Gini (net lines):       {:.3}", self.team.gini_contribution)?;
        writeln!(
            f,
            "  Top-3 share:            {:.1}%",
            self.team.top_contributors_share * 100.0
        )?;
        for c in &self.team.contributions {
            writeln!(f, "  {:<30} {:>+8}", c.author, c.net_lines)?;
        }

        writeln!(f, "\nCommits")?;
        writeln!(f, "  Analyzed:               {}", self.commits.count)?;
        writeln!(
            f,
            "  Compartmentalization:   median {:.3}, mean {:.3}",
            self.commits.median_compartmentalization, self.commits.mean_compartmentalization
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> AnalysisLimits {
        AnalysisLimits {
            since: "2024-01-01T00:00:00Z".into(),
            max_commits: 100,
            truncated: false,
        }
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn output_format_default_is_text() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn change_weight_is_floored_at_one() {
        let file = FileStat {
            filename: "a.rs".into(),
            additions: 0,
            deletions: 0,
        };
        assert_eq!(file.change_weight(), 1);

        let file = FileStat {
            filename: "a.rs".into(),
            additions: 4,
            deletions: 3,
        };
        assert_eq!(file.change_weight(), 7);
    }

    #[test]
    fn result_serializes_camel_case() {
        let mut result = AnalysisResult::empty("octocat/hello-world", limits());
        result.languages.insert("Rust".into(), 1234);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["repo"], "octocat/hello-world");
        assert_eq!(json["limits"]["maxCommits"], 100);
        assert_eq!(json["limits"]["truncated"], false);
        assert_eq!(json["languages"]["Rust"], 1234);
        assert_eq!(json["team"]["giniContribution"], 0.0);
        assert_eq!(json["team"]["topContributorsShare"], 0.0);
        assert!(json["team"]["contributions"].as_array().unwrap().is_empty());
        assert!(json["team"]["perAuthorLanguage"].as_array().unwrap().is_empty());
        assert_eq!(json["commits"]["count"], 0);
        assert_eq!(json["commits"]["medianCompartmentalization"], 1.0);
        assert_eq!(json["commits"]["meanCompartmentalization"], 1.0);
        assert!(json.get("error").is_none());
        assert!(json.get("suggestion").is_none());
    }

    #[test]
    fn failed_result_displays_hint() {
        let mut result = AnalysisResult::empty("octocat/hello-world", limits());
        result.error = Some(AnalysisFailure {
            kind: FailureKind::RateLimitExceeded,
            message: "rate limit exceeded, resets at 1700000000".into(),
            status: Some(403),
            reset_epoch: Some(1_700_000_000),
        });
        result.suggestion = Some("Provide a GitHub token".into());

        let text = result.to_string();
        assert!(text.contains("Error: rate limit exceeded"));
        assert!(text.contains("Hint: Provide a GitHub token"));
        assert!(!text.contains("Team"));
    }

    #[test]
    fn result_display_lists_contributors() {
        let mut result = AnalysisResult::empty("octocat/hello-world", limits());
        result.team.contributions = vec![
            AuthorNetLines {
                author: "alice".into(),
                net_lines: 120,
            },
            AuthorNetLines {
                author: "bob".into(),
                net_lines: -30,
            },
        ];
        let text = result.to_string();
        assert!(text.contains("alice"));
        assert!(text.contains("-30"));
    }
}
