//! Spreadsheet tag taxonomy sync.
//!
//! Reads `(file name, tags)` rows exported from the tag spreadsheet and
//! mirrors them into the `file`, `tag` and `file_tag` tables. Master rows are
//! upserted by name and never deleted; each file's links are replaced inside
//! one transaction per file.
//!
//! # Example
//!
//! ```no_run
//! use docket_fetch::{Database, read_tag_sheet, sync_tags};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open(Path::new("tags.db")).await?;
//! let rows = read_tag_sheet(Path::new("tags.csv")).await?;
//! let report = sync_tags(&db, &rows).await?;
//! println!("{} files synced", report.files_synced);
//! # Ok(())
//! # }
//! ```

mod sheet;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::db::Database;

pub use sheet::parse_tag_sheet;

/// One spreadsheet row: a file and the tags it should carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRow {
    /// Natural key of the `file` row.
    pub file_name: String,
    /// Tag names, trimmed and without repeats.
    pub tags: Vec<String>,
}

/// Errors from reading a tag sheet or writing the taxonomy.
#[derive(Debug, Error)]
pub enum TagSyncError {
    /// The sheet file could not be read.
    #[error("cannot read tag sheet {path}: {source}")]
    Io {
        /// Sheet path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The sheet is not valid CSV.
    #[error("tag sheet line {line}: {message}")]
    Sheet {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// A database statement failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Counts from one [`sync_tags`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagSyncReport {
    /// Rows whose links were rewritten.
    pub files_synced: usize,
    /// `file` rows inserted by this run.
    pub files_created: usize,
    /// `tag` rows inserted by this run.
    pub tags_created: usize,
    /// `file_tag` rows written by this run.
    pub links_written: usize,
}

/// Reads and parses a tag sheet CSV export.
///
/// # Errors
///
/// Returns [`TagSyncError::Io`] if the file cannot be read and
/// [`TagSyncError::Sheet`] if it is malformed.
pub async fn read_tag_sheet(path: &Path) -> Result<Vec<TagRow>, TagSyncError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| TagSyncError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_tag_sheet(&text)
}

/// Upserts files and tags and relinks each file to exactly its row's tags.
///
/// A file listed with no tags ends up with no links. Tags that no longer
/// appear in the sheet stay in the `tag` table.
///
/// # Errors
///
/// Returns [`TagSyncError::Database`] if any statement fails; the failing
/// file's transaction is rolled back and earlier files stay committed.
#[instrument(skip(db, rows), fields(rows = rows.len()))]
pub async fn sync_tags(db: &Database, rows: &[TagRow]) -> Result<TagSyncReport, TagSyncError> {
    let mut report = TagSyncReport::default();

    for row in rows {
        let mut tx = db.pool().begin().await?;

        let inserted = sqlx::query("INSERT OR IGNORE INTO file (name) VALUES (?)")
            .bind(&row.file_name)
            .execute(&mut *tx)
            .await?;
        report.files_created += usize::from(inserted.rows_affected() > 0);

        let file_id: i64 = sqlx::query_scalar("SELECT id FROM file WHERE name = ?")
            .bind(&row.file_name)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM file_tag WHERE file_id = ?")
            .bind(file_id)
            .execute(&mut *tx)
            .await?;

        for tag in &row.tags {
            let inserted = sqlx::query("INSERT OR IGNORE INTO tag (name) VALUES (?)")
                .bind(tag)
                .execute(&mut *tx)
                .await?;
            report.tags_created += usize::from(inserted.rows_affected() > 0);

            let tag_id: i64 = sqlx::query_scalar("SELECT id FROM tag WHERE name = ?")
                .bind(tag)
                .fetch_one(&mut *tx)
                .await?;

            sqlx::query("INSERT OR IGNORE INTO file_tag (file_id, tag_id) VALUES (?, ?)")
                .bind(file_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
            report.links_written += 1;
        }

        tx.commit().await?;
        report.files_synced += 1;
        debug!(file = %row.file_name, tags = row.tags.len(), "file relinked");
    }

    info!(
        files = report.files_synced,
        files_created = report.files_created,
        tags_created = report.tags_created,
        links = report.links_written,
        "tag sync complete"
    );
    Ok(report)
}
