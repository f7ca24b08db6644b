//! Bounded-concurrency commit detail fetching.
//!
//! Commits are fetched in fixed-size batches. Within a batch, a semaphore
//! admits at most `concurrency` requests at once and each admitted request
//! waits `request_delay` before going out. Batches run one after another with
//! `batch_delay` in between. A failure anywhere aborts the whole fetch: the
//! rest of its batch is allowed to settle, their results are dropped, and no
//! further batches start.

use std::time::Duration;

use futures::future::join_all;
use repopulse_core::{CommitDetail, CommitSummary, FetchConfig, PulseError};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::client::GitHubClient;

/// Fan-out settings for [`fetch_details`].
///
/// # Examples
///
/// ```
/// use repopulse_github::DetailOptions;
///
/// let options = DetailOptions::default();
/// assert_eq!(options.concurrency, 5);
/// assert_eq!(options.batch_size, 10);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DetailOptions {
    /// Maximum simultaneous detail requests.
    pub concurrency: usize,
    /// Commits per batch.
    pub batch_size: usize,
    /// Pause between batches.
    pub batch_delay: Duration,
    /// Pause taken inside the gate before each request.
    pub request_delay: Duration,
}

impl DetailOptions {
    /// Build options from `[fetch]` settings. Zero sizes are raised to 1.
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            batch_size: config.batch_size.max(1),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            request_delay: Duration::from_millis(config.request_delay_ms),
        }
    }
}

impl Default for DetailOptions {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Fetch diff statistics for every commit, preserving input order.
///
/// # Errors
///
/// Returns the first failure (in input order) from the batch in which any
/// request failed. No partial result is returned.
pub async fn fetch_details(
    client: &GitHubClient,
    owner: &str,
    repo: &str,
    commits: &[CommitSummary],
    options: &DetailOptions,
) -> Result<Vec<CommitDetail>, PulseError> {
    let gate = Semaphore::new(options.concurrency.max(1));
    let batches: Vec<&[CommitSummary]> = commits.chunks(options.batch_size.max(1)).collect();
    let batch_count = batches.len();
    let mut details = Vec::with_capacity(commits.len());

    for (index, batch) in batches.into_iter().enumerate() {
        debug!(
            owner,
            repo,
            batch = index + 1,
            of = batch_count,
            size = batch.len(),
            "fetching commit details"
        );

        let settled = join_all(batch.iter().map(|commit| {
            fetch_one(client, &gate, owner, repo, &commit.sha, options.request_delay)
        }))
        .await;

        let failures = settled.iter().filter(|r| r.is_err()).count();
        if failures > 0 {
            warn!(
                owner,
                repo,
                batch = index + 1,
                failures,
                "commit detail batch failed, discarding fetched details"
            );
        }
        let fetched = settled.into_iter().collect::<Result<Vec<_>, _>>()?;
        details.extend(fetched);

        if index + 1 < batch_count {
            tokio::time::sleep(options.batch_delay).await;
        }
    }

    Ok(details)
}

async fn fetch_one(
    client: &GitHubClient,
    gate: &Semaphore,
    owner: &str,
    repo: &str,
    sha: &str,
    request_delay: Duration,
) -> Result<CommitDetail, PulseError> {
    let _permit = gate
        .acquire()
        .await
        .map_err(|_| PulseError::Network("commit detail gate closed".into()))?;
    tokio::time::sleep(request_delay).await;
    client.commit_detail(owner, repo, sha).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::credentials::Anonymous;
    use crate::mock::{MockReply, MockTransport};
    use repopulse_core::GitHubConfig;
    use serde_json::json;

    fn detail_url(sha: &str) -> String {
        format!("https://api.github.com/repos/octocat/hello/commits/{sha}")
    }

    fn summaries(n: usize) -> Vec<CommitSummary> {
        (0..n)
            .map(|i| CommitSummary {
                sha: format!("c{i}"),
                author_login: None,
            })
            .collect()
    }

    fn scripted(n: usize) -> MockTransport {
        (0..n).fold(MockTransport::new(), |transport, i| {
            let sha = format!("c{i}");
            transport.reply(
                &detail_url(&sha),
                MockReply::json(json!({
                    "sha": sha,
                    "author": {"login": format!("dev{}", i % 3)},
                    "stats": {"additions": i, "deletions": 0},
                    "files": []
                })),
            )
        })
    }

    fn client(transport: &Arc<MockTransport>) -> GitHubClient {
        GitHubClient::with_transport(
            &GitHubConfig::default(),
            transport.clone(),
            Arc::new(Anonymous),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn returns_one_detail_per_commit_in_order() {
        let transport = Arc::new(scripted(23));
        let client = client(&transport);

        let details = fetch_details(
            &client,
            "octocat",
            "hello",
            &summaries(23),
            &DetailOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(details.len(), 23);
        for (i, detail) in details.iter().enumerate() {
            assert_eq!(detail.sha, format!("c{i}"));
            assert_eq!(detail.stats.additions, i as u64);
        }
        assert_eq!(transport.request_count(), 23);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_requests_never_exceed_gate() {
        let transport = Arc::new(scripted(20).with_latency(Duration::from_millis(300)));
        let client = client(&transport);
        let options = DetailOptions {
            concurrency: 3,
            ..DetailOptions::default()
        };

        fetch_details(&client, "octocat", "hello", &summaries(20), &options)
            .await
            .unwrap();

        assert_eq!(transport.peak_concurrency(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn batches_are_paced() {
        let transport = Arc::new(scripted(25));
        let client = client(&transport);
        let options = DetailOptions {
            concurrency: 10,
            batch_size: 10,
            batch_delay: Duration::from_millis(500),
            request_delay: Duration::ZERO,
        };

        let started = tokio::time::Instant::now();
        fetch_details(&client, "octocat", "hello", &summaries(25), &options)
            .await
            .unwrap();
        let waited = started.elapsed();

        // three batches, two gaps
        assert!(waited >= Duration::from_millis(1000), "waited {waited:?}");
        assert!(waited < Duration::from_millis(1500), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn each_request_waits_inside_the_gate() {
        let transport = Arc::new(scripted(4));
        let client = client(&transport);
        let options = DetailOptions {
            concurrency: 1,
            batch_size: 10,
            batch_delay: Duration::ZERO,
            request_delay: Duration::from_millis(100),
        };

        let started = tokio::time::Instant::now();
        let details = fetch_details(&client, "octocat", "hello", &summaries(4), &options)
            .await
            .unwrap();
        let waited = started.elapsed();

        assert_eq!(details.len(), 4);
        // one permit, so the four delays run back to back
        assert!(waited >= Duration::from_millis(400), "waited {waited:?}");
        assert!(waited < Duration::from_millis(500), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn failure_aborts_remaining_batches() {
        let transport = Arc::new(
            (0..30)
                .filter(|i| *i != 12)
                .fold(MockTransport::new(), |t, i| {
                    let sha = format!("c{i}");
                    t.reply(&detail_url(&sha), MockReply::json(json!({"sha": sha})))
                })
                .reply(
                    &detail_url("c12"),
                    MockReply::status(403, "API rate limit exceeded")
                        .with_header("x-ratelimit-reset", "1800000000"),
                ),
        );
        let client = client(&transport);

        let err = fetch_details(
            &client,
            "octocat",
            "hello",
            &summaries(30),
            &DetailOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            PulseError::RateLimitExceeded {
                reset_epoch: 1800000000
            }
        ));
        // batch 1 (c0..c9) and batch 2 (c10..c19) ran; batch 3 never started
        assert_eq!(transport.request_count(), 20);
        assert_eq!(transport.requests_to(&detail_url("c25")), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_input_makes_no_requests() {
        let transport = Arc::new(MockTransport::new());
        let client = client(&transport);

        let details = fetch_details(&client, "octocat", "hello", &[], &DetailOptions::default())
            .await
            .unwrap();

        assert!(details.is_empty());
        assert_eq!(transport.request_count(), 0);
    }
}
