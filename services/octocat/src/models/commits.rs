//! Commit data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Account;

/// A commit object, as returned by `GET /repos/{owner}/{repo}/commits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    /// The SHA of the commit.
    pub sha: String,

    /// The git-level commit details.
    pub commit: CommitDetails,

    /// The Github account linked to the author email, if any.
    #[serde(default)]
    pub author: Option<Account>,
}

/// The author and message for a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetails {
    /// The author of the commit.
    #[serde(default)]
    pub author: Option<AuthorCommitDetails>,

    /// The commit message.
    pub message: String,

    /// API URL of the git commit object.
    #[serde(default)]
    pub url: String,
}

/// The author and date for a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorCommitDetails {
    /// Author name
    pub name: String,
    /// Author email
    pub email: String,
    /// The date of the commit.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}
