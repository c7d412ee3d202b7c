//! SQLite store for the tag taxonomy (`file`, `tag`, `file_tag`).
//!
//! Opening a store applies the embedded migrations. Every connection enforces
//! foreign keys, which the `file_tag` link table depends on.
//!
//! # Example
//!
//! ```no_run
//! use docket_fetch::Database;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open(Path::new("tags.db")).await?;
//! // Hand it to sync_tags, or query db.pool() directly.
//! db.close().await;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::{debug, instrument};

/// Tag sync writes one file per transaction from a single task; one
/// connection keeps writers from contending for the file lock.
const MAX_CONNECTIONS: u32 = 1;

/// How long a statement waits on a lock held by another process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors opening or migrating the taxonomy store.
#[derive(Error, Debug)]
pub enum DbError {
    /// The database file could not be opened or created.
    #[error("cannot open tag database {path}: {source}")]
    Open {
        /// Database path.
        path: PathBuf,
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },

    /// A connection-level statement failed.
    #[error("tag database error: {0}")]
    Query(#[from] sqlx::Error),

    /// The embedded schema could not be applied.
    #[error("failed to migrate tag database: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    fn open(path: &Path, source: sqlx::Error) -> Self {
        Self::Open {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Handle on a migrated taxonomy store.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the store at `db_path` and migrates it.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Open` if the file cannot be opened or created,
    /// or `DbError::Migration` if the schema cannot be applied.
    #[instrument(skip(db_path), fields(path = %db_path.display()))]
    pub async fn open(db_path: &Path) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = connect(options)
            .await
            .map_err(|source| DbError::open(db_path, source))?;
        Self::migrated(pool).await
    }

    /// Opens a private in-memory store, used by tests and dry runs.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Query` if the connection fails,
    /// or `DbError::Migration` if the schema cannot be applied.
    #[instrument]
    pub async fn open_in_memory() -> Result<Self, DbError> {
        let options: SqliteConnectOptions = "sqlite::memory:".parse()?;
        let pool = connect(options).await?;
        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> Result<Self, DbError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!("tag database ready");
        Ok(Self { pool })
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Waits for in-flight statements and closes the store.
    #[instrument(skip(self))]
    pub async fn close(self) {
        self.pool.close().await;
    }
}

async fn connect(options: SqliteConnectOptions) -> Result<SqlitePool, sqlx::Error> {
    // `file_tag` references both master tables.
    let options = options.foreign_keys(true).busy_timeout(BUSY_TIMEOUT);
    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tags::{TagRow, sync_tags};

    async fn count(db: &Database, table: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap();
        n
    }

    #[tokio::test]
    async fn test_open_in_memory_applies_taxonomy_schema() {
        let db = Database::open_in_memory().await.unwrap();

        assert_eq!(count(&db, "file").await, 0);
        assert_eq!(count(&db, "tag").await, 0);
        assert_eq!(count(&db, "file_tag").await, 0);
    }

    #[tokio::test]
    async fn test_file_name_is_unique() {
        let db = Database::open_in_memory().await.unwrap();

        sqlx::query("INSERT INTO file (name) VALUES ('Notice.pdf')")
            .execute(db.pool())
            .await
            .unwrap();
        let duplicate = sqlx::query("INSERT INTO file (name) VALUES ('Notice.pdf')")
            .execute(db.pool())
            .await;

        assert!(duplicate.is_err(), "file.name must be unique");
    }

    #[tokio::test]
    async fn test_link_requires_master_rows() {
        let db = Database::open_in_memory().await.unwrap();

        let result = sqlx::query("INSERT INTO file_tag (file_id, tag_id) VALUES (99, 99)")
            .execute(db.pool())
            .await;

        assert!(result.is_err(), "dangling file_tag row was accepted");
    }

    #[tokio::test]
    async fn test_open_file_enforces_foreign_keys_and_persists_sync() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("tags.db");

        let db = Database::open(&db_path).await.unwrap();
        let (foreign_keys,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(foreign_keys, 1);

        let row = TagRow {
            file_name: "Notice.pdf".to_string(),
            tags: vec!["notice".to_string(), "rate case".to_string()],
        };
        sync_tags(&db, &[row]).await.unwrap();
        db.close().await;

        let reopened = Database::open(&db_path).await.unwrap();
        assert_eq!(count(&reopened, "file").await, 1);
        assert_eq!(count(&reopened, "file_tag").await, 2);
        reopened.close().await;
    }

    #[tokio::test]
    async fn test_open_reports_path_when_parent_is_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("missing").join("tags.db");

        let err = Database::open(&db_path).await.unwrap_err();

        assert!(matches!(err, DbError::Open { ref path, .. } if path == &db_path));
        assert!(err.to_string().contains("tags.db"));
    }
}
