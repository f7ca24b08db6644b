//! JSON shapes returned by the GitHub commits endpoints.
//!
//! Only the fields the analysis relies on are modelled; everything else in
//! the payload is ignored. GitHub sends `null` for unlinked accounts.

use repopulse_core::{CommitDetail, CommitStats, CommitSummary, FileStat};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ListedCommit {
    sha: String,
    #[serde(default)]
    author: Option<Account>,
}

#[derive(Debug, Deserialize)]
struct Account {
    #[serde(default)]
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitPayload {
    sha: String,
    #[serde(default)]
    author: Option<Account>,
    #[serde(default)]
    commit: Option<GitCommit>,
    #[serde(default)]
    stats: Option<Stats>,
    #[serde(default)]
    files: Option<Vec<ChangedFile>>,
}

#[derive(Debug, Deserialize)]
struct GitCommit {
    #[serde(default)]
    author: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Stats {
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
}

#[derive(Debug, Deserialize)]
struct ChangedFile {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
}

impl From<ListedCommit> for CommitSummary {
    fn from(listed: ListedCommit) -> Self {
        CommitSummary {
            sha: listed.sha,
            author_login: listed.author.and_then(|a| a.login),
        }
    }
}

impl From<CommitPayload> for CommitDetail {
    fn from(payload: CommitPayload) -> Self {
        let stats = payload.stats.unwrap_or_default();
        CommitDetail {
            sha: payload.sha,
            author_login: payload.author.and_then(|a| a.login),
            author_email: payload
                .commit
                .and_then(|c| c.author)
                .and_then(|s| s.email),
            stats: CommitStats {
                additions: stats.additions,
                deletions: stats.deletions,
            },
            files: payload
                .files
                .unwrap_or_default()
                .into_iter()
                .map(|f| FileStat {
                    filename: f.filename,
                    additions: f.additions,
                    deletions: f.deletions,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_commit_with_null_author() {
        let json = r#"{"sha": "abc", "author": null, "commit": {"message": "x"}}"#;
        let listed: ListedCommit = serde_json::from_str(json).unwrap();
        let summary = CommitSummary::from(listed);
        assert_eq!(summary.sha, "abc");
        assert!(summary.author_login.is_none());
    }

    #[test]
    fn commit_payload_maps_all_fields() {
        let json = r#"{
            "sha": "def456",
            "author": {"login": "octocat", "id": 1},
            "commit": {
                "author": {
                    "name": "Octo Cat",
                    "email": "octo@github.com",
                    "date": "2024-01-01T00:00:00Z"
                }
            },
            "stats": {"total": 15, "additions": 12, "deletions": 3},
            "files": [
                {"filename": "src/main.rs", "status": "modified",
                 "additions": 10, "deletions": 3, "changes": 13},
                {"filename": "README.md", "status": "modified",
                 "additions": 2, "deletions": 0, "changes": 2}
            ]
        }"#;
        let payload: CommitPayload = serde_json::from_str(json).unwrap();
        let detail = CommitDetail::from(payload);

        assert_eq!(detail.sha, "def456");
        assert_eq!(detail.author_login.as_deref(), Some("octocat"));
        assert_eq!(detail.author_email.as_deref(), Some("octo@github.com"));
        assert_eq!(detail.stats.additions, 12);
        assert_eq!(detail.stats.deletions, 3);
        assert_eq!(detail.files.len(), 2);
        assert_eq!(detail.files[0].filename, "src/main.rs");
        assert_eq!(detail.files[1].additions, 2);
    }

    #[test]
    fn commit_payload_tolerates_missing_sections() {
        let payload: CommitPayload = serde_json::from_str(r#"{"sha": "0"}"#).unwrap();
        let detail = CommitDetail::from(payload);
        assert!(detail.author_login.is_none());
        assert!(detail.author_email.is_none());
        assert_eq!(detail.stats, CommitStats::default());
        assert!(detail.files.is_empty());
    }
}
