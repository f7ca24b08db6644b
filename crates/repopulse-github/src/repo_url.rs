use std::fmt;

use repopulse_core::PulseError;

/// An `owner/name` pair identifying a GitHub repository.
///
/// # Examples
///
/// ```
/// use repopulse_github::parse_repo_url;
///
/// let repo = parse_repo_url("https://github.com/rust-lang/rust").unwrap();
/// assert_eq!(repo.owner, "rust-lang");
/// assert_eq!(repo.name, "rust");
/// assert_eq!(repo.to_string(), "rust-lang/rust");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    /// Account or organization login.
    pub owner: String,
    /// Repository name without a `.git` suffix.
    pub name: String,
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parse a repository URL of the form `https://github.com/owner/repo[.git]`.
///
/// A trailing slash is tolerated; extra path segments, other hosts, and
/// missing components are rejected.
///
/// # Errors
///
/// Returns [`PulseError::Validation`] if the URL does not have that shape.
///
/// # Examples
///
/// ```
/// use repopulse_github::parse_repo_url;
///
/// let repo = parse_repo_url("https://github.com/octocat/hello-world.git/").unwrap();
/// assert_eq!(repo.name, "hello-world");
/// assert!(parse_repo_url("https://gitlab.com/octocat/hello-world").is_err());
/// ```
pub fn parse_repo_url(url: &str) -> Result<RepoRef, PulseError> {
    let invalid = || {
        PulseError::Validation(format!(
            "invalid GitHub repository URL '{url}', expected https://github.com/owner/repo"
        ))
    };

    let trimmed = url.trim().trim_end_matches('/');
    let Some(path) = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
    else {
        return Err(invalid());
    };

    let mut segments = path.split('/');
    let host = segments.next().unwrap_or_default();
    if !host.eq_ignore_ascii_case("github.com") && !host.eq_ignore_ascii_case("www.github.com") {
        return Err(invalid());
    }

    let (Some(owner), Some(repo), None) = (segments.next(), segments.next(), segments.next())
    else {
        return Err(invalid());
    };
    let repo = repo.strip_suffix(".git").unwrap_or(repo);

    if !is_valid_segment(owner) || !is_valid_segment(repo) {
        return Err(invalid());
    }

    Ok(RepoRef {
        owner: owner.to_string(),
        name: repo.to_string(),
    })
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
