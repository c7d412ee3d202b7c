//! Errors that abort a retrieval batch.
//!
//! Per-document network problems are not errors here; they are reported as
//! [`RetrievalOutcome::Failed`](super::RetrievalOutcome::Failed). Only
//! filesystem failures stop the batch, because no later document could be
//! written either.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal retrieval errors.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The destination directory or a document file could not be written.
    #[error("IO error at {path}: {source}")]
    Filesystem {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl RetrievalError {
    /// Creates a filesystem error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}
