//! Walk every repository of an organization, attaching latest-commit data.

use chrono::{DateTime, Utc};
use futures::StreamExt as _;
use octocat::GithubClient;
use thiserror::Error;

use crate::lookup;
use crate::record::{CommitSummary, RepositoryRecord};

/// Page size used when listing repositories.
pub const DEFAULT_PER_PAGE: usize = 10;

/// Listing the organization's repositories failed. No records are returned.
#[derive(Debug, Error)]
pub enum EnumerateError {
    /// The listing request could not be built.
    #[error("Listing repositories for {organization}: {source}")]
    Request {
        /// Organization being listed.
        organization: String,
        /// Underlying client error.
        #[source]
        source: octocat::Error,
    },

    /// A page of the listing could not be fetched or decoded.
    #[error("Listing repositories for {organization} (after {fetched} repositories): {source}")]
    Page {
        /// Organization being listed.
        organization: String,
        /// Repositories received before the failure.
        fetched: usize,
        /// Underlying page error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Whole days from `updated_at` until `now`, rounded down.
///
/// A repository without an update timestamp counts as updated `now`.
pub fn days_since(updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    updated_at
        .map(|updated| (now - updated).num_seconds().div_euclid(86_400))
        .unwrap_or_default()
}

/// Sequentially builds one [`RepositoryRecord`] per repository in an organization.
#[derive(Debug, Clone)]
pub struct RepositoryEnumerator<'c> {
    client: &'c GithubClient,
    organization: String,
    per_page: usize,
    now: DateTime<Utc>,
}

impl<'c> RepositoryEnumerator<'c> {
    /// Enumerate `organization`, measuring repository age from the current time.
    pub fn new(client: &'c GithubClient, organization: impl Into<String>) -> Self {
        Self {
            client,
            organization: organization.into(),
            per_page: DEFAULT_PER_PAGE,
            now: Utc::now(),
        }
    }

    /// Set the listing page size.
    pub fn per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    /// Fix the instant repository ages are measured against.
    pub fn now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Fetch every repository, in listing order.
    ///
    /// Each non-archived repository costs one extra request for its latest
    /// commit. A failed commit lookup leaves the commit columns empty; a
    /// failed listing page aborts the whole run.
    #[tracing::instrument(skip(self), fields(organization = %self.organization))]
    pub async fn run(&self) -> Result<Vec<RepositoryRecord>, EnumerateError> {
        let repositories = self
            .client
            .org_repositories(&self.organization, self.per_page)
            .map_err(|source| EnumerateError::Request {
                organization: self.organization.clone(),
                source,
            })?;
        let mut repositories = std::pin::pin!(repositories);

        let mut records = Vec::new();
        while let Some(repository) = repositories.next().await {
            let repository = repository.map_err(|source| {
                tracing::error!("Listing repositories failed: {source}");
                EnumerateError::Page {
                    organization: self.organization.clone(),
                    fetched: records.len(),
                    source,
                }
            })?;

            let commit = if repository.archived {
                CommitSummary::default()
            } else {
                let days = days_since(repository.updated_at, self.now);
                lookup::latest_commit(self.client, &self.organization, &repository.name, days)
                    .await
                    .into_summary()
            };

            let record = RepositoryRecord::new(&repository, commit);
            tracing::info!(
                "Repo #{}: {} ({}) -- Days: {}, {}",
                records.len() + 1,
                record.name,
                record.default_branch,
                record.commit.days_since_last_commit,
                record.commit.author_alias
            );
            records.push(record);
        }

        Ok(records)
    }
}
