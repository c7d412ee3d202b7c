//! Sequential, paced download of discovered documents.
//!
//! Documents are fetched one at a time in index order. The destination
//! directory is the only ledger: a file already present under the record's
//! filename is skipped without any request, which makes reruns cheap and
//! idempotent. Bodies are streamed to `{filename}.part` and renamed into place
//! once complete.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use docket_fetch::{DocumentRetriever, HttpClient, LinkIndex, RetrievalOptions};
//!
//! # async fn example(index: LinkIndex) -> Result<(), Box<dyn std::error::Error>> {
//! let retriever = DocumentRetriever::new(HttpClient::new()?)
//!     .with_options(RetrievalOptions::with_pace(Duration::from_secs(1)));
//! let report = retriever.retrieve(&index, Path::new("./utc_220066")).await?;
//! println!("saved {}, skipped {}, failed {}", report.saved(), report.skipped(), report.failed());
//! # Ok(())
//! # }
//! ```

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

use crate::cancel::CancelFlag;
use crate::discovery::{DocumentRecord, LinkIndex};
use crate::events::{EventSink, FetchEvent, TracingSink};
use crate::http::{HttpClient, HttpError};

pub use error::RetrievalError;

/// Magic bytes every PDF starts with.
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Suffix of in-flight download files.
const PARTIAL_SUFFIX: &str = ".part";

/// Result of retrieving one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalOutcome {
    /// The body was written to `path`.
    Saved {
        /// Final file path.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// A file already existed at `path`; nothing was fetched.
    SkippedExisting {
        /// Existing file path.
        path: PathBuf,
    },
    /// The document could not be fetched; the batch continued.
    Failed {
        /// Human-readable failure description.
        reason: String,
    },
}

/// Per-document outcomes of a retrieval batch, in index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalReport {
    /// `(doc_id, outcome)` pairs in processing order.
    pub outcomes: Vec<(String, RetrievalOutcome)>,
    /// True when the batch stopped early because of cancellation.
    pub interrupted: bool,
}

impl RetrievalReport {
    /// Number of documents written in this run.
    #[must_use]
    pub fn saved(&self) -> usize {
        self.count(|o| matches!(o, RetrievalOutcome::Saved { .. }))
    }

    /// Number of documents skipped because they were already present.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RetrievalOutcome::SkippedExisting { .. }))
    }

    /// Number of documents that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RetrievalOutcome::Failed { .. }))
    }

    /// Outcome for one document, if it was processed.
    #[must_use]
    pub fn outcome(&self, doc_id: &str) -> Option<&RetrievalOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == doc_id)
            .map(|(_, outcome)| outcome)
    }

    fn count(&self, predicate: impl Fn(&RetrievalOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| predicate(o)).count()
    }
}

/// Tunables for [`DocumentRetriever`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalOptions {
    /// Delay after each successful download. Values under ~0.5 s risk
    /// throttling by the document proxy.
    pub pace: Duration,
    /// Reject bodies that do not start with `%PDF-`.
    pub require_pdf_header: bool,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            pace: Duration::from_secs(1),
            require_pdf_header: false,
        }
    }
}

impl RetrievalOptions {
    /// Default options with a custom pace.
    #[must_use]
    pub fn with_pace(pace: Duration) -> Self {
        Self {
            pace,
            ..Self::default()
        }
    }
}

/// Downloads the documents of a [`LinkIndex`] into a directory.
pub struct DocumentRetriever {
    client: HttpClient,
    options: RetrievalOptions,
    sink: Arc<dyn EventSink>,
    cancel: Option<CancelFlag>,
}

impl std::fmt::Debug for DocumentRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentRetriever")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

enum StreamFailure {
    Network(HttpError),
    NotPdf,
    Io(std::io::Error),
}

impl DocumentRetriever {
    /// Creates a retriever with default options, logging via `tracing`.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            options: RetrievalOptions::default(),
            sink: Arc::new(TracingSink),
            cancel: None,
        }
    }

    /// Replaces the retrieval options.
    #[must_use]
    pub fn with_options(mut self, options: RetrievalOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Stops before the next document once `flag` is raised.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Retrieves every document in `index` into `destination`.
    ///
    /// The directory (and missing parents) is created first. Per-document
    /// network failures are recorded as [`RetrievalOutcome::Failed`] and the
    /// batch continues.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Filesystem`] when the directory cannot be
    /// created or a document cannot be written.
    #[instrument(skip(self, index, destination), fields(destination = %destination.display(), documents = index.len()))]
    pub async fn retrieve(
        &self,
        index: &LinkIndex,
        destination: &Path,
    ) -> Result<RetrievalReport, RetrievalError> {
        tokio::fs::create_dir_all(destination)
            .await
            .map_err(|e| RetrievalError::io(destination, e))?;

        let mut report = RetrievalReport::default();
        let total = index.len();

        for (position, record) in index.iter().enumerate() {
            if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                debug!(doc_id = %record.doc_id, "retrieval cancelled");
                report.interrupted = true;
                break;
            }

            let outcome = self.retrieve_one(record, destination).await?;
            let saved = matches!(outcome, RetrievalOutcome::Saved { .. });
            report.outcomes.push((record.doc_id.clone(), outcome));

            if saved && position + 1 < total && !self.options.pace.is_zero() {
                tokio::time::sleep(self.options.pace).await;
            }
        }

        debug!(
            saved = report.saved(),
            skipped = report.skipped(),
            failed = report.failed(),
            "retrieval finished"
        );
        Ok(report)
    }

    async fn retrieve_one(
        &self,
        record: &DocumentRecord,
        destination: &Path,
    ) -> Result<RetrievalOutcome, RetrievalError> {
        let path = destination.join(&record.filename);

        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| RetrievalError::io(&path, e))?;
        if exists {
            self.sink.emit(&FetchEvent::DocumentSkipped {
                doc_id: record.doc_id.clone(),
                path: path.clone(),
            });
            return Ok(RetrievalOutcome::SkippedExisting { path });
        }

        debug!(doc_id = %record.doc_id, url = %record.source_url, "downloading");
        let response = match self.client.fetch_document(&record.source_url).await {
            Ok(response) => response,
            Err(error) => return Ok(self.failed(record, error.to_string())),
        };

        let partial = partial_path(&path);
        match stream_to_file(
            response,
            &record.source_url,
            &partial,
            self.options.require_pdf_header,
        )
        .await
        {
            Ok(bytes) => {
                tokio::fs::rename(&partial, &path)
                    .await
                    .map_err(|e| RetrievalError::io(&path, e))?;
                self.sink.emit(&FetchEvent::DocumentSaved {
                    doc_id: record.doc_id.clone(),
                    path: path.clone(),
                    bytes,
                });
                Ok(RetrievalOutcome::Saved { path, bytes })
            }
            Err(failure) => {
                debug!(path = %partial.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(&partial).await;
                match failure {
                    StreamFailure::Network(error) => Ok(self.failed(record, error.to_string())),
                    StreamFailure::NotPdf => Ok(self.failed(
                        record,
                        "response body is not a PDF (missing %PDF- header)".to_string(),
                    )),
                    StreamFailure::Io(error) => Err(RetrievalError::io(partial, error)),
                }
            }
        }
    }

    fn failed(&self, record: &DocumentRecord, reason: String) -> RetrievalOutcome {
        self.sink.emit(&FetchEvent::DocumentFailed {
            doc_id: record.doc_id.clone(),
            url: record.source_url.clone(),
            reason: reason.clone(),
        });
        RetrievalOutcome::Failed { reason }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

/// Streams the response body to `file_path`, returning bytes written.
async fn stream_to_file(
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    require_pdf_header: bool,
) -> Result<u64, StreamFailure> {
    let file = File::create(file_path).await.map_err(StreamFailure::Io)?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut head: Vec<u8> = Vec::with_capacity(PDF_MAGIC.len());
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| StreamFailure::Network(HttpError::network(url, e)))?;

        if require_pdf_header && head.len() < PDF_MAGIC.len() {
            let wanted = PDF_MAGIC.len() - head.len();
            head.extend_from_slice(&chunk[..wanted.min(chunk.len())]);
            if head.len() == PDF_MAGIC.len() && head != PDF_MAGIC {
                return Err(StreamFailure::NotPdf);
            }
        }

        writer.write_all(&chunk).await.map_err(StreamFailure::Io)?;
        bytes_written += chunk.len() as u64;
    }

    if require_pdf_header && head != PDF_MAGIC {
        return Err(StreamFailure::NotPdf);
    }

    writer.flush().await.map_err(StreamFailure::Io)?;
    Ok(bytes_written)
}
