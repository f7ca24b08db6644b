use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{SecondsFormat, TimeDelta, Utc};
use futures::FutureExt;
use repopulse_core::{
    AnalysisFailure, AnalysisLimits, AnalysisResult, FailureKind, PulseConfig, PulseError,
};
use repopulse_github::{
    fetch_details, list_commits, parse_repo_url, CredentialProvider, DetailOptions, GitHubClient,
    ListingOptions, RepoRef,
};
use tracing::{info, warn};

/// Remediation hint attached to rate-limit failures.
pub const RATE_LIMIT_SUGGESTION: &str =
    "Provide a GitHub token or reduce max_commits/window_days";

/// Drives one repository analysis from URL to [`AnalysisResult`].
///
/// Holds no per-invocation state, so a single analyzer can serve concurrent
/// calls.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use repopulse_analyze::Analyzer;
/// use repopulse_core::PulseConfig;
/// use repopulse_github::Anonymous;
///
/// # async fn run() -> repopulse_core::Result<()> {
/// let analyzer = Analyzer::from_config(&PulseConfig::default(), Arc::new(Anonymous))?;
/// let result = analyzer.analyze("https://github.com/octocat/hello-world", 90, 500).await;
/// println!("{}", result.commits.count);
/// # Ok(())
/// # }
/// ```
pub struct Analyzer {
    client: GitHubClient,
    listing: ListingOptions,
    details: DetailOptions,
}

impl Analyzer {
    /// Create an analyzer over an existing client.
    pub fn new(client: GitHubClient, listing: ListingOptions, details: DetailOptions) -> Self {
        Self {
            client,
            listing,
            details,
        }
    }

    /// Create an analyzer talking to GitHub with the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Config`] if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn from_config(
        config: &PulseConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, PulseError> {
        config.validate()?;
        let client = GitHubClient::new(&config.github, credentials)?;
        Ok(Self::new(
            client,
            ListingOptions::from_config(&config.fetch),
            DetailOptions::from_config(&config.fetch),
        ))
    }

    /// The underlying API client, e.g. to inspect the last observed quota.
    pub fn client(&self) -> &GitHubClient {
        &self.client
    }

    /// Analyze up to `max_commits` commits from the last `window_days` days.
    ///
    /// Never fails: invalid input, API failures, and panics inside the
    /// pipeline all come back as a result whose `error` is set, with default
    /// metrics. Input is validated before any request is made. A window with
    /// no commits is not an error; it yields default metrics, the language
    /// totals, and a `warning`.
    pub async fn analyze(
        &self,
        repo_url: &str,
        window_days: u32,
        max_commits: usize,
    ) -> AnalysisResult {
        let since = window_start(window_days);
        let mut limits = AnalysisLimits {
            since: since.clone().unwrap_or_default(),
            max_commits,
            truncated: false,
        };

        let repo = match validate(repo_url, since, max_commits) {
            Ok(repo) => repo,
            Err(err) => return failure(repo_url.trim(), limits, &err),
        };

        info!(repo = %repo, since = %limits.since, max_commits, "analyzing repository");

        // `run` records truncation in `limits` before any later stage can fail.
        let outcome = AssertUnwindSafe(self.run(&repo, &mut limits))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => {
                info!(
                    repo = %repo,
                    commits = result.commits.count,
                    truncated = result.limits.truncated,
                    "analysis complete"
                );
                result
            }
            Ok(Err(err)) => failure(&repo.to_string(), limits, &err),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(repo = %repo, %message, "analysis panicked");
                let mut result = AnalysisResult::empty(repo.to_string(), limits);
                result.error = Some(AnalysisFailure {
                    kind: FailureKind::Unexpected,
                    message: format!("unexpected failure: {message}"),
                    status: None,
                    reset_epoch: None,
                });
                result
            }
        }
    }

    async fn run(
        &self,
        repo: &RepoRef,
        limits: &mut AnalysisLimits,
    ) -> Result<AnalysisResult, PulseError> {
        let languages = self.client.repo_languages(&repo.owner, &repo.name).await?;

        let listing = list_commits(
            &self.client,
            &repo.owner,
            &repo.name,
            &limits.since,
            limits.max_commits,
            &self.listing,
        )
        .await?;
        limits.truncated = listing.truncated;

        if listing.commits.is_empty() {
            let mut result = AnalysisResult::empty(repo.to_string(), limits.clone());
            result.languages = languages;
            result.warning = Some(format!("no commits found since {}", result.limits.since));
            return Ok(result);
        }

        let details = fetch_details(
            &self.client,
            &repo.owner,
            &repo.name,
            &listing.commits,
            &self.details,
        )
        .await?;

        let metrics = repopulse_metrics::aggregate(&details);

        let mut result = AnalysisResult::empty(repo.to_string(), limits.clone());
        result.languages = languages;
        result.team = metrics.team;
        result.commits = metrics.commits;
        Ok(result)
    }
}

/// Start of a window `window_days` long ending now, as RFC 3339 UTC with a
/// `Z` suffix. `None` if the window reaches outside the supported date range.
///
/// # Examples
///
/// ```
/// use repopulse_analyze::window_start;
///
/// let since = window_start(30).unwrap();
/// assert!(since.ends_with('Z'));
/// assert!(window_start(u32::MAX).is_none());
/// ```
pub fn window_start(window_days: u32) -> Option<String> {
    let span = TimeDelta::try_days(i64::from(window_days))?;
    let start = Utc::now().checked_sub_signed(span)?;
    Some(start.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn validate(
    repo_url: &str,
    since: Option<String>,
    max_commits: usize,
) -> Result<RepoRef, PulseError> {
    let repo = parse_repo_url(repo_url)?;
    if max_commits < 1 {
        return Err(PulseError::Validation("max_commits must be at least 1".into()));
    }
    if since.is_none() {
        return Err(PulseError::Validation("window_days is too large".into()));
    }
    Ok(repo)
}

fn failure(repo: &str, limits: AnalysisLimits, err: &PulseError) -> AnalysisResult {
    let kind = err.kind();
    warn!(repo, kind = ?kind, error = %err, "analysis failed");

    let (status, reset_epoch) = match err {
        PulseError::RateLimitExceeded { reset_epoch } => (Some(403), Some(*reset_epoch)),
        PulseError::NotFound(_) => (Some(404), None),
        PulseError::Api { status, .. } => (Some(*status), None),
        _ => (None, None),
    };

    let mut result = AnalysisResult::empty(repo, limits);
    result.error = Some(AnalysisFailure {
        kind,
        message: err.to_string(),
        status,
        reset_epoch,
    });
    if kind == FailureKind::RateLimitExceeded {
        result.suggestion = Some(RATE_LIMIT_SUGGESTION.to_string());
    }
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
