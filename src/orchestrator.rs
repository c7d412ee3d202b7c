//! One-call docket fetch: discover every document, then download them.
//!
//! This layer adds no retries or error recovery of its own; it wires a
//! [`LinkDiscovery`] and a [`DocumentRetriever`] to the same HTTP client,
//! event sink and cancellation flag.
//!
//! # Example
//!
//! ```no_run
//! use docket_fetch::{DocketFetcher, Docket, FetchRequest, HttpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = DocketFetcher::new(HttpClient::new()?);
//! // downloads every filing in docket 220066 (2022-present) to ./utc_220066
//! let index = fetcher
//!     .fetch_docket(&FetchRequest::new(Docket::new("220066")?, 2022))
//!     .await?;
//! println!("{} documents", index.len());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, instrument};

use crate::cancel::CancelFlag;
use crate::discovery::{LinkDiscovery, LinkIndex};
use crate::docket::{Clock, ConfigError, Docket};
use crate::events::{EventSink, TracingSink};
use crate::http::HttpClient;
use crate::retrieval::{DocumentRetriever, RetrievalError, RetrievalOptions, RetrievalReport};

/// Default delay between successful document downloads.
pub const DEFAULT_PACE: Duration = Duration::from_secs(1);

/// Errors that stop a docket fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Invalid docket, year range or portal URL.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The destination could not be written.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

/// Default destination directory for a docket: `./utc_{docket}`.
#[must_use]
pub fn default_destination(docket: &Docket) -> PathBuf {
    Path::new(".").join(format!("utc_{docket}"))
}

/// Parameters of one docket fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Docket to fetch.
    pub docket: Docket,
    /// First filing year.
    pub start_year: i32,
    /// Last filing year; the current year when `None`.
    pub end_year: Option<i32>,
    /// Destination directory; [`default_destination`] when `None`.
    pub destination: Option<PathBuf>,
    /// Delay after each successful download.
    pub pace: Duration,
}

impl FetchRequest {
    /// Request for `docket` from `start_year` to the current year, into the
    /// default destination, with the default pace.
    #[must_use]
    pub fn new(docket: Docket, start_year: i32) -> Self {
        Self {
            docket,
            start_year,
            end_year: None,
            destination: None,
            pace: DEFAULT_PACE,
        }
    }

    /// Sets the last filing year.
    #[must_use]
    pub fn end_year(mut self, end_year: i32) -> Self {
        self.end_year = Some(end_year);
        self
    }

    /// Sets the destination directory.
    #[must_use]
    pub fn destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Sets the pace between downloads.
    #[must_use]
    pub fn pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// The destination directory this request writes to.
    #[must_use]
    pub fn resolved_destination(&self) -> PathBuf {
        self.destination
            .clone()
            .unwrap_or_else(|| default_destination(&self.docket))
    }
}

/// Composes discovery and retrieval over one shared HTTP client.
pub struct DocketFetcher {
    discovery: LinkDiscovery,
    client: HttpClient,
    sink: Arc<dyn EventSink>,
    cancel: Option<CancelFlag>,
    require_pdf_header: bool,
}

impl std::fmt::Debug for DocketFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocketFetcher")
            .field("discovery", &self.discovery)
            .field("require_pdf_header", &self.require_pdf_header)
            .finish_non_exhaustive()
    }
}

impl DocketFetcher {
    /// Creates a fetcher against the public portal.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self {
            discovery: LinkDiscovery::new(client.clone()),
            client,
            sink: Arc::new(TracingSink),
            cancel: None,
            require_pdf_header: false,
        }
    }

    /// Points discovery at a different portal root.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPortalUrl`] for non-http(s) URLs.
    pub fn with_portal_base(mut self, base: &str) -> Result<Self, ConfigError> {
        self.discovery = self.discovery.with_portal_base(base)?;
        Ok(self)
    }

    /// Sends discovery and retrieval events to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.discovery = self.discovery.with_sink(Arc::clone(&sink));
        self.sink = sink;
        self
    }

    /// Replaces the clock used for the default end year.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.discovery = self.discovery.with_clock(clock);
        self
    }

    /// Stops both phases between iterations once `flag` is raised.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.discovery = self.discovery.with_cancel_flag(flag.clone());
        self.cancel = Some(flag);
        self
    }

    /// Rejects downloaded bodies that do not start with `%PDF-`.
    #[must_use]
    pub fn require_pdf_header(mut self, require: bool) -> Self {
        self.require_pdf_header = require;
        self
    }

    /// Discovers and downloads a docket, returning the discovered index.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Config`] for an inverted year range and
    /// [`FetchError::Retrieval`] when the destination cannot be written.
    pub async fn fetch_docket(&self, request: &FetchRequest) -> Result<LinkIndex, FetchError> {
        Ok(self.fetch_docket_with_report(request).await?.0)
    }

    /// Like [`fetch_docket`](Self::fetch_docket), also returning the
    /// per-document retrieval report.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_docket`](Self::fetch_docket).
    #[instrument(skip(self, request), fields(docket = %request.docket, start_year = request.start_year))]
    pub async fn fetch_docket_with_report(
        &self,
        request: &FetchRequest,
    ) -> Result<(LinkIndex, RetrievalReport), FetchError> {
        let index = self
            .discovery
            .discover(&request.docket, request.start_year, request.end_year)
            .await?;

        let destination = request.resolved_destination();
        let report = self
            .retriever(request.pace)
            .retrieve(&index, &destination)
            .await?;

        info!(
            discovered = index.len(),
            saved = report.saved(),
            skipped = report.skipped(),
            failed = report.failed(),
            destination = %destination.display(),
            "docket fetch complete"
        );
        Ok((index, report))
    }

    fn retriever(&self, pace: Duration) -> DocumentRetriever {
        let retriever = DocumentRetriever::new(self.client.clone())
            .with_options(RetrievalOptions {
                pace,
                require_pdf_header: self.require_pdf_header,
            })
            .with_sink(Arc::clone(&self.sink));
        match &self.cancel {
            Some(flag) => retriever.with_cancel_flag(flag.clone()),
            None => retriever,
        }
    }
}
