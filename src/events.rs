//! Structured progress events emitted by discovery and retrieval.
//!
//! Components take an `Arc<dyn EventSink>` instead of logging through global
//! state, so callers (and tests) decide where progress goes. [`TracingSink`]
//! is the default and forwards everything to `tracing`.

use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{debug, info, warn};

/// A single observable step of a docket run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    /// A year's listing page was parsed.
    YearScanned {
        /// Filing year.
        year: i32,
        /// Newly recorded documents for this year (after cross-year dedup).
        documents: usize,
    },
    /// A year's listing page could not be fetched; the year contributes nothing.
    YearUnavailable {
        /// Filing year.
        year: i32,
        /// Listing page URL.
        url: String,
        /// Human-readable failure description.
        reason: String,
    },
    /// Discovery finished for the whole range.
    DiscoveryComplete {
        /// Unique documents in the index.
        total: usize,
    },
    /// A document body was written to disk.
    DocumentSaved {
        /// Document identifier.
        doc_id: String,
        /// Final file path.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// A document was already present at its destination path.
    DocumentSkipped {
        /// Document identifier.
        doc_id: String,
        /// Existing file path.
        path: PathBuf,
    },
    /// A document could not be fetched.
    DocumentFailed {
        /// Document identifier.
        doc_id: String,
        /// Source URL.
        url: String,
        /// Human-readable failure description.
        reason: String,
    },
}

/// Receiver for [`FetchEvent`]s.
pub trait EventSink: Send + Sync {
    /// Handles one event. Must not block for long; the pipeline is sequential.
    fn emit(&self, event: &FetchEvent);
}

/// Forwards events to `tracing` at info (progress) and warn (failures) level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &FetchEvent) {
        match event {
            FetchEvent::YearScanned { year, documents } => {
                info!(year, documents, "year scanned");
            }
            FetchEvent::YearUnavailable { year, url, reason } => {
                warn!(year, url = %url, reason = %reason, "listing page unavailable");
            }
            FetchEvent::DiscoveryComplete { total } => {
                info!(total, "total unique documents");
            }
            FetchEvent::DocumentSaved {
                doc_id,
                path,
                bytes,
            } => {
                info!(doc_id = %doc_id, path = %path.display(), bytes, "saved");
            }
            FetchEvent::DocumentSkipped { doc_id, path } => {
                debug!(doc_id = %doc_id, path = %path.display(), "already present, skipping");
            }
            FetchEvent::DocumentFailed {
                doc_id,
                url,
                reason,
            } => {
                warn!(doc_id = %doc_id, url = %url, reason = %reason, "document fetch failed");
            }
        }
    }
}

/// Collects events in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<FetchEvent>>,
}

impl RecordingSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every event recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<FetchEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &FetchEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }
}
