//! Export the repositories of a Github organization, each with its most recent
//! commit, to a CSV file.
//!
//! The pipeline is strictly sequential: the [`RepositoryEnumerator`] pages
//! through the organization's repositories, looks up the latest commit of every
//! non-archived one, and [`write_export`] flattens the resulting records into
//! `repos.<random>.csv`.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use octocat::GithubClient;
use thiserror::Error;

pub mod enumerate;
pub mod export;
pub mod lookup;
pub mod record;
pub mod settings;

pub use crate::enumerate::{EnumerateError, RepositoryEnumerator};
pub use crate::export::{read_export, write_export, ExportError, ExportRow};
pub use crate::lookup::CommitLookup;
pub use crate::record::{CommitSummary, RepositoryRecord};
pub use crate::settings::Settings;

/// A fatal error during an export run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The repository listing failed.
    #[error(transparent)]
    Enumerate(#[from] EnumerateError),

    /// The export file could not be written.
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Enumerate `organization` and write the export file into `output_dir`.
///
/// Repository ages are measured against `now`. Returns the path of the
/// written file.
pub async fn export_organization(
    client: &GithubClient,
    organization: &str,
    per_page: usize,
    output_dir: &Utf8Path,
    now: DateTime<Utc>,
) -> Result<Utf8PathBuf, RunError> {
    let records = RepositoryEnumerator::new(client, organization)
        .per_page(per_page)
        .now(now)
        .run()
        .await?;

    tracing::info!("Exporting {} repositories", records.len());
    Ok(write_export(&records, output_dir)?)
}
