//! Paginated commit listing within a time window.

use std::time::Duration;

use repopulse_core::{CommitSummary, FetchConfig, PulseError};
use tracing::debug;

use crate::client::GitHubClient;

/// Largest `per_page` GitHub accepts on the commits endpoint.
pub const SERVER_PAGE_MAX: usize = 100;

/// Pacing for [`list_commits`].
///
/// # Examples
///
/// ```
/// use repopulse_github::ListingOptions;
/// use std::time::Duration;
///
/// assert_eq!(ListingOptions::default().page_delay, Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ListingOptions {
    /// Courtesy delay before each page after the first.
    pub page_delay: Duration,
}

impl ListingOptions {
    /// Build options from `[fetch]` settings.
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            page_delay: Duration::from_millis(config.page_delay_ms),
        }
    }
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Commits found in the window, newest first.
#[derive(Debug, Clone)]
pub struct CommitListing {
    /// At most `max_commits` entries.
    pub commits: Vec<CommitSummary>,
    /// The cap was reached, so older commits in the window may have been skipped.
    pub truncated: bool,
}

/// List commits since `since` (RFC 3339), stopping at `max_commits`.
///
/// Requests pages of `min(100, max_commits)` starting at page 1 and stops on
/// a short or empty page, or once `max_commits` have been collected.
///
/// # Errors
///
/// Propagates any [`PulseError`] from the client.
pub async fn list_commits(
    client: &GitHubClient,
    owner: &str,
    repo: &str,
    since: &str,
    max_commits: usize,
    options: &ListingOptions,
) -> Result<CommitListing, PulseError> {
    if max_commits == 0 {
        return Ok(CommitListing {
            commits: Vec::new(),
            truncated: false,
        });
    }

    let per_page = SERVER_PAGE_MAX.min(max_commits);
    let mut commits: Vec<CommitSummary> = Vec::new();
    let mut page = 1u32;

    loop {
        let batch = client
            .commits_page(owner, repo, since, per_page, page)
            .await?;
        let received = batch.len();
        debug!(owner, repo, page, received, "listed commit page");
        commits.extend(batch);

        if received < per_page || commits.len() >= max_commits {
            break;
        }

        page += 1;
        tokio::time::sleep(options.page_delay).await;
    }

    commits.truncate(max_commits);
    let truncated = commits.len() >= max_commits;
    Ok(CommitListing { commits, truncated })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::credentials::Anonymous;
    use crate::mock::{MockReply, MockTransport};
    use repopulse_core::GitHubConfig;
    use serde_json::{json, Value};

    const COMMITS: &str = "https://api.github.com/repos/octocat/hello/commits";
    const SINCE: &str = "2024-01-01T00:00:00Z";

    fn page_of(start: usize, len: usize) -> Value {
        Value::Array(
            (start..start + len)
                .map(|i| json!({"sha": format!("sha{i}"), "author": {"login": "dev"}}))
                .collect(),
        )
    }

    fn client(transport: &Arc<MockTransport>) -> GitHubClient {
        GitHubClient::with_transport(
            &GitHubConfig::default(),
            transport.clone(),
            Arc::new(Anonymous),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_short_page() {
        let transport = Arc::new(
            MockTransport::new()
                .reply_page(COMMITS, 1, MockReply::json(page_of(0, 100)))
                .reply_page(COMMITS, 2, MockReply::json(page_of(100, 30))),
        );
        let client = client(&transport);

        let listing = list_commits(
            &client,
            "octocat",
            "hello",
            SINCE,
            500,
            &ListingOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(listing.commits.len(), 130);
        assert!(!listing.truncated);
        assert_eq!(transport.request_count(), 2);
        assert_eq!(listing.commits[0].sha, "sha0");
        assert_eq!(listing.commits[129].sha, "sha129");
    }

    #[tokio::test(start_paused = true)]
    async fn halts_exactly_at_cap_with_more_pages_available() {
        let transport = Arc::new(
            MockTransport::new()
                .reply_page(COMMITS, 1, MockReply::json(page_of(0, 100)))
                .reply_page(COMMITS, 2, MockReply::json(page_of(100, 100)))
                .reply_page(COMMITS, 3, MockReply::json(page_of(200, 100))),
        );
        let client = client(&transport);

        let listing = list_commits(
            &client,
            "octocat",
            "hello",
            SINCE,
            150,
            &ListingOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(listing.commits.len(), 150);
        assert!(listing.truncated);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn small_cap_shrinks_page_size() {
        let transport = Arc::new(
            MockTransport::new().reply_page(COMMITS, 1, MockReply::json(page_of(0, 20))),
        );
        let client = client(&transport);

        let listing = list_commits(
            &client,
            "octocat",
            "hello",
            SINCE,
            20,
            &ListingOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(listing.commits.len(), 20);
        assert!(listing.truncated);
        let sent = &transport.requests()[0];
        assert_eq!(sent.query_param("per_page"), Some("20"));
        assert_eq!(sent.query_param("page"), Some("1"));
        assert_eq!(sent.query_param("since"), Some(SINCE));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_window_returns_nothing() {
        let transport = Arc::new(MockTransport::new().reply(COMMITS, MockReply::json(json!([]))));
        let client = client(&transport);

        let listing = list_commits(
            &client,
            "octocat",
            "hello",
            SINCE,
            500,
            &ListingOptions::default(),
        )
        .await
        .unwrap();

        assert!(listing.commits.is_empty());
        assert!(!listing.truncated);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pages_are_spaced_by_courtesy_delay() {
        let transport = Arc::new(
            MockTransport::new()
                .reply_page(COMMITS, 1, MockReply::json(page_of(0, 100)))
                .reply_page(COMMITS, 2, MockReply::json(page_of(100, 100)))
                .reply_page(COMMITS, 3, MockReply::json(page_of(200, 10))),
        );
        let client = client(&transport);
        let options = ListingOptions {
            page_delay: Duration::from_millis(250),
        };

        let started = tokio::time::Instant::now();
        list_commits(&client, "octocat", "hello", SINCE, 1000, &options)
            .await
            .unwrap();

        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(500), "waited {waited:?}");
        assert!(waited < Duration::from_millis(750), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn listing_failure_propagates() {
        let transport = Arc::new(
            MockTransport::new()
                .reply_page(COMMITS, 1, MockReply::json(page_of(0, 100)))
                .reply_page(COMMITS, 2, MockReply::status(500, "boom")),
        );
        let client = client(&transport);

        let err = list_commits(&client, "octocat", "hello", SINCE, 500, &ListingOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PulseError::Api { status: 500, .. }));
    }
}
