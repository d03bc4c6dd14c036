//! CSV export of repository records.

use std::io;

use camino::{FromPathBufError, Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{CommitSummary, RepositoryRecord};

const FILE_PREFIX: &str = "repos.";
const FILE_SUFFIX: &str = ".csv";

/// Column names, in file order.
pub const COLUMNS: [&str; 20] = [
    "id",
    "repo_name",
    "owner",
    "default_branch",
    "language",
    "is_private",
    "is_archived",
    "has_issues",
    "fork_count",
    "created_at",
    "updated_at",
    "repo_url",
    "repo_description",
    "last_commit_sha",
    "days_since_last_commit",
    "commit_author_name",
    "commit_author_email",
    "commit_author_alias",
    "commit_merge_message",
    "commit_message_url",
];

/// Errors writing or reading an export file.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The export file could not be created.
    #[error("Creating export file in {dir}: {source}")]
    Create {
        /// Directory the file was to be created in.
        dir: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A row could not be written or parsed.
    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Buffered rows could not be flushed to disk.
    #[error("Flushing export file: {0}")]
    Flush(#[source] io::Error),

    /// The temporary file could not be kept.
    #[error("Persisting export file: {0}")]
    Persist(#[source] io::Error),

    /// The generated file name is not valid UTF-8.
    #[error("Export path: {0}")]
    Path(#[from] FromPathBufError),
}

/// One CSV row. Columns follow [`COLUMNS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    id: u64,
    repo_name: String,
    owner: String,
    default_branch: String,
    language: String,
    is_private: bool,
    is_archived: bool,
    has_issues: bool,
    fork_count: u64,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    repo_url: String,
    repo_description: String,
    last_commit_sha: String,
    days_since_last_commit: i64,
    commit_author_name: String,
    commit_author_email: String,
    commit_author_alias: String,
    commit_merge_message: String,
    commit_message_url: String,
}

impl From<&RepositoryRecord> for ExportRow {
    fn from(record: &RepositoryRecord) -> Self {
        let commit = &record.commit;
        Self {
            id: record.id,
            repo_name: record.name.clone(),
            owner: record.owner.clone(),
            default_branch: record.default_branch.clone(),
            language: record.language.clone(),
            is_private: record.is_private,
            is_archived: record.is_archived,
            has_issues: record.has_issues,
            fork_count: record.fork_count,
            created_at: record.created_at,
            updated_at: record.updated_at,
            repo_url: record.url.clone(),
            repo_description: record.description.clone(),
            last_commit_sha: commit.sha.clone(),
            days_since_last_commit: commit.days_since_last_commit,
            commit_author_name: commit.author_name.clone(),
            commit_author_email: commit.author_email.clone(),
            commit_author_alias: commit.author_alias.clone(),
            commit_merge_message: commit.message.clone(),
            commit_message_url: commit.url.clone(),
        }
    }
}

impl From<ExportRow> for RepositoryRecord {
    fn from(row: ExportRow) -> Self {
        Self {
            id: row.id,
            name: row.repo_name,
            owner: row.owner,
            default_branch: row.default_branch,
            language: row.language,
            is_private: row.is_private,
            is_archived: row.is_archived,
            has_issues: row.has_issues,
            fork_count: row.fork_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
            url: row.repo_url,
            description: row.repo_description,
            commit: CommitSummary {
                sha: row.last_commit_sha,
                days_since_last_commit: row.days_since_last_commit,
                author_name: row.commit_author_name,
                author_email: row.commit_author_email,
                author_alias: row.commit_author_alias,
                message: row.commit_merge_message,
                url: row.commit_message_url,
            },
        }
    }
}

/// Write `records` to a new `repos.<random>.csv` file in `dir`.
///
/// The file name is unique; an existing export is never overwritten.
/// Returns the path of the written file.
#[tracing::instrument(skip(records), fields(rows = records.len()))]
pub fn write_export(
    records: &[RepositoryRecord],
    dir: &Utf8Path,
) -> Result<Utf8PathBuf, ExportError> {
    let file = tempfile::Builder::new()
        .prefix(FILE_PREFIX)
        .suffix(FILE_SUFFIX)
        .tempfile_in(dir)
        .map_err(|source| ExportError::Create {
            dir: dir.to_owned(),
            source,
        })?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    // Written explicitly so an empty export still carries a header.
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(ExportRow::from(record))?;
    }

    let file = writer
        .into_inner()
        .map_err(|error| ExportError::Flush(error.into_error()))?;
    let (_, path) = file.keep().map_err(|error| ExportError::Persist(error.error))?;
    let path = Utf8PathBuf::try_from(path)?;

    tracing::debug!(%path, "Wrote export");
    Ok(path)
}

/// Read records back from an export file.
pub fn read_export(path: &Utf8Path) -> Result<Vec<RepositoryRecord>, ExportError> {
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize::<ExportRow>()
        .map(|row| row.map(RepositoryRecord::from).map_err(ExportError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn record(id: u64, archived: bool) -> RepositoryRecord {
        let commit = if archived {
            CommitSummary::default()
        } else {
            CommitSummary {
                sha: format!("sha{id}"),
                days_since_last_commit: 7,
                author_name: "Road Runner".into(),
                author_email: "beep@acme.test".into(),
                author_alias: "roadrunner".into(),
                message: "Merge pull request #9\n\nMeep, \"meep\"".into(),
                url: format!("https://api.github.com/repos/acme/r{id}/git/commits/sha{id}"),
            }
        };

        RepositoryRecord {
            id,
            name: format!("r{id}"),
            owner: "acme".into(),
            default_branch: "main".into(),
            language: if id % 2 == 0 { "Rust".into() } else { String::new() },
            is_private: id % 2 == 0,
            is_archived: archived,
            has_issues: true,
            fork_count: id * 3,
            created_at: Some(Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap()),
            updated_at: if archived {
                None
            } else {
                Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            },
            url: format!("https://api.github.com/repos/acme/r{id}"),
            description: "Widgets, gadgets".into(),
            commit,
        }
    }

    #[test]
    fn header_and_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(dir.path()).unwrap();

        let path = write_export(&[record(1, false)], dir).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();

        assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
        assert!(lines.next().unwrap().starts_with(
            "1,r1,acme,main,,false,false,true,3,2021-03-04T05:06:07Z,2024-01-01T00:00:00Z,"
        ));
    }

    #[test]
    fn file_name_is_unique() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(dir.path()).unwrap();

        let first = write_export(&[], dir).unwrap();
        let second = write_export(&[], dir).unwrap();
        assert_ne!(first, second);

        for path in [&first, &second] {
            let name = path.file_name().unwrap();
            assert!(name.starts_with("repos.") && name.ends_with(".csv"), "{name}");
            assert_eq!(std::fs::read_to_string(path).unwrap().trim_end(), COLUMNS.join(","));
        }
    }

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(dir.path()).unwrap();
        let records = vec![record(1, false), record(2, true), record(3, false)];

        let path = write_export(&records, dir).unwrap();
        let read = read_export(&path).unwrap();

        assert_eq!(read, records);
        assert!(read[1].commit.is_empty());
        assert_eq!(read[1].commit.days_since_last_commit, 0);
    }

    #[test]
    fn missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Utf8Path::from_path(dir.path()).unwrap().join("nope");

        let err = write_export(&[], &missing).unwrap_err();
        assert!(matches!(err, ExportError::Create { .. }));
    }
}
