//! One exported row: a repository and a summary of its latest commit.

use chrono::{DateTime, Utc};
use octocat::models::{Commit, Repository};

/// Metadata about the most recent commit of a repository.
///
/// The default value is the "no commit" summary used for archived
/// repositories and for failed or empty lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Commit hash.
    pub sha: String,

    /// Whole days between the repository's `updated_at` and the time of the
    /// export.
    ///
    /// This is deliberately *not* derived from the commit's own date:
    /// consumers of the export rely on it tracking repository activity.
    pub days_since_last_commit: i64,

    /// Git author name.
    pub author_name: String,

    /// Git author email.
    pub author_email: String,

    /// Github login linked to the author, if any.
    pub author_alias: String,

    /// Full commit message.
    pub message: String,

    /// API URL of the git commit object.
    pub url: String,
}

impl CommitSummary {
    /// Summarize a commit, attaching a precomputed day count.
    pub fn from_commit(commit: &Commit, days_since_last_commit: i64) -> Self {
        let author = commit.commit.author.as_ref();
        Self {
            sha: commit.sha.clone(),
            days_since_last_commit,
            author_name: author.map(|a| a.name.clone()).unwrap_or_default(),
            author_email: author.map(|a| a.email.clone()).unwrap_or_default(),
            author_alias: commit
                .author
                .as_ref()
                .map(|account| account.login.clone())
                .unwrap_or_default(),
            message: commit.commit.message.clone(),
            url: commit.commit.url.clone(),
        }
    }

    /// Whether this is the empty "no commit" summary.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A repository flattened for export.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    pub id: u64,
    pub name: String,
    pub owner: String,
    pub default_branch: String,
    pub language: String,
    pub is_private: bool,
    pub is_archived: bool,
    pub has_issues: bool,
    pub fork_count: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub url: String,
    pub description: String,
    pub commit: CommitSummary,
}

impl RepositoryRecord {
    /// Build a record from an API repository and its commit summary.
    pub fn new(repository: &Repository, commit: CommitSummary) -> Self {
        Self {
            id: repository.id,
            name: repository.name.clone(),
            owner: repository.owner.login.clone(),
            default_branch: repository.default_branch.clone().unwrap_or_default(),
            language: repository.language.clone().unwrap_or_default(),
            is_private: repository.private,
            is_archived: repository.archived,
            has_issues: repository.has_issues,
            fork_count: repository.forks_count,
            created_at: repository.created_at,
            updated_at: repository.updated_at,
            url: repository.url.clone(),
            description: repository.description.clone().unwrap_or_default(),
            commit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(author: serde_json::Value) -> Commit {
        serde_json::from_value(serde_json::json!({
            "sha": "f00d",
            "commit": {
                "url": "https://api.github.com/repos/acme/w/git/commits/f00d",
                "author": {"name": "Ada", "email": "ada@acme.test", "date": "2020-01-01T00:00:00Z"},
                "message": "Merge pull request #1"
            },
            "author": author,
        }))
        .unwrap()
    }

    #[test]
    fn summary_uses_supplied_days() {
        let commit = commit(serde_json::json!({"login": "ada", "id": 3}));
        let summary = CommitSummary::from_commit(&commit, 12);

        assert_eq!(summary.sha, "f00d");
        assert_eq!(summary.days_since_last_commit, 12);
        assert_eq!(summary.author_name, "Ada");
        assert_eq!(summary.author_email, "ada@acme.test");
        assert_eq!(summary.author_alias, "ada");
        assert_eq!(summary.message, "Merge pull request #1");
        assert!(!summary.is_empty());
    }

    #[test]
    fn summary_without_linked_account_has_blank_alias() {
        let summary = CommitSummary::from_commit(&commit(serde_json::Value::Null), 0);
        assert_eq!(summary.author_alias, "");
        assert_eq!(summary.author_name, "Ada");
    }

    #[test]
    fn missing_optional_fields_become_blank() {
        let repository: Repository = serde_json::from_value(serde_json::json!({
            "id": 5,
            "name": "bare",
            "owner": {"login": "acme", "id": 1},
            "url": "https://api.github.com/repos/acme/bare",
            "language": null,
            "description": null
        }))
        .unwrap();

        let record = RepositoryRecord::new(&repository, CommitSummary::default());
        assert_eq!(record.language, "");
        assert_eq!(record.description, "");
        assert_eq!(record.default_branch, "");
        assert!(record.created_at.is_none());
        assert!(record.commit.is_empty());
    }
}
