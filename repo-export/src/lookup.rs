//! Latest-commit lookup for a single repository.

use octocat::GithubClient;

use crate::record::CommitSummary;

/// Outcome of asking Github for a repository's latest commit.
#[derive(Debug)]
pub enum CommitLookup {
    /// The repository has at least one commit.
    Found(CommitSummary),

    /// The repository has no commits.
    Empty,

    /// The request failed. The export continues without commit data.
    Failed(octocat::Error),
}

impl CommitLookup {
    /// The summary to export, empty unless a commit was found.
    pub fn into_summary(self) -> CommitSummary {
        match self {
            CommitLookup::Found(summary) => summary,
            CommitLookup::Empty | CommitLookup::Failed(_) => CommitSummary::default(),
        }
    }
}

/// Look up the newest commit of `owner/repo`.
///
/// `days_since_last_commit` is attached to the summary as-is. Failures are
/// logged and returned, never propagated.
pub async fn latest_commit(
    client: &GithubClient,
    owner: &str,
    repo: &str,
    days_since_last_commit: i64,
) -> CommitLookup {
    match client.latest_commit(owner, repo).await {
        Ok(Some(commit)) => {
            CommitLookup::Found(CommitSummary::from_commit(&commit, days_since_last_commit))
        }
        Ok(None) => {
            tracing::debug!(repo, "no commits");
            CommitLookup::Empty
        }
        Err(error) => {
            tracing::warn!(
                repo,
                status = ?error.status(),
                "Unable to fetch latest commit: {error}"
            );
            CommitLookup::Failed(error)
        }
    }
}
