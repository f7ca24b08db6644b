use repopulse_core::CommitDetail;

/// Key used for commits with neither a login nor an email.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Resolve the key a commit is attributed to.
///
/// The first non-empty of login, email, and [`UNKNOWN_AUTHOR`] wins. Every
/// metric attributes by this key so the ledgers stay consistent.
///
/// # Examples
///
/// ```
/// use repopulse_core::{CommitDetail, CommitStats};
/// use repopulse_metrics::author_key;
///
/// let detail = CommitDetail {
///     sha: "abc".into(),
///     author_login: Some("".into()),
///     author_email: Some("dev@example.com".into()),
///     stats: CommitStats::default(),
///     files: vec![],
/// };
/// assert_eq!(author_key(&detail), "dev@example.com");
/// ```
pub fn author_key(detail: &CommitDetail) -> &str {
    [detail.author_login.as_deref(), detail.author_email.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
        .unwrap_or(UNKNOWN_AUTHOR)
}
