//! Repository data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Account;

/// A repository, as returned by `GET /orgs/{org}/repos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Numeric repository ID.
    pub id: u64,

    /// Short name, without the owner.
    pub name: String,

    /// The owning user or organization.
    pub owner: Account,

    /// Default branch. Absent for some empty repositories.
    #[serde(default)]
    pub default_branch: Option<String>,

    /// Primary language as detected by Github.
    #[serde(default)]
    pub language: Option<String>,

    /// Whether the repository is private.
    #[serde(default)]
    pub private: bool,

    /// Whether the repository is archived (read only).
    #[serde(default)]
    pub archived: bool,

    /// Whether the issue tracker is enabled.
    #[serde(default)]
    pub has_issues: bool,

    /// Number of forks.
    #[serde(default)]
    pub forks_count: u64,

    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Last time the repository object was updated.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Canonical API URL of the repository.
    pub url: String,

    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
}
