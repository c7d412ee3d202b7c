//! Year-sliding discovery of document links for a docket.
//!
//! For every year in the requested range the listing page
//! `{portal}/{year}/{docket}/docsets` is fetched and scanned for links to the
//! document proxy (`GetDocument?docID=...`). Results accumulate in a
//! [`LinkIndex`] keyed by `doc_id`; the first year that lists an id wins, so
//! filings re-listed under later years are not fetched twice.
//!
//! A year whose page is missing or unreachable contributes nothing and does
//! not stop the scan.
//!
//! # Example
//!
//! ```no_run
//! use docket_fetch::{Docket, HttpClient, LinkDiscovery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let discovery = LinkDiscovery::new(HttpClient::new()?);
//! let index = discovery.discover(&Docket::new("220066")?, 2022, None).await?;
//! for record in &index {
//!     println!("{} -> {}", record.doc_id, record.filename);
//! }
//! # Ok(())
//! # }
//! ```

mod filename;
mod index;
mod links;

use std::sync::Arc;

use tracing::{debug, instrument, trace};
use url::Url;

use crate::cancel::CancelFlag;
use crate::docket::{Clock, ConfigError, Docket, SystemClock, YearRange};
use crate::events::{EventSink, FetchEvent, TracingSink};
use crate::http::HttpClient;

pub use filename::derive_filename;
pub use index::{DocumentRecord, LinkIndex};
pub use links::{DOCUMENT_LINK_MARKER, extract_doc_id};

/// Root of the commission's case docket listing pages.
pub const DEFAULT_PORTAL_BASE_URL: &str = "https://www.utc.wa.gov/casedocket";

/// Per-year result of a discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSummary {
    /// Filing year.
    pub year: i32,
    /// Newly recorded documents for this year.
    pub documents: usize,
    /// False when the listing page could not be fetched.
    pub available: bool,
}

/// Per-year breakdown of a discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// One entry per scanned year, ascending.
    pub years: Vec<YearSummary>,
    /// True when the run stopped early because of cancellation.
    pub interrupted: bool,
}

impl DiscoveryReport {
    /// Years whose listing page could not be fetched.
    #[must_use]
    pub fn unavailable_years(&self) -> Vec<i32> {
        self.years
            .iter()
            .filter(|summary| !summary.available)
            .map(|summary| summary.year)
            .collect()
    }

    /// Total documents recorded across all years.
    #[must_use]
    pub fn total(&self) -> usize {
        self.years.iter().map(|summary| summary.documents).sum()
    }
}

/// Scans a docket's yearly listing pages for document links.
pub struct LinkDiscovery {
    client: HttpClient,
    portal_base: String,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    cancel: Option<CancelFlag>,
}

impl std::fmt::Debug for LinkDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkDiscovery")
            .field("portal_base", &self.portal_base)
            .finish_non_exhaustive()
    }
}

impl LinkDiscovery {
    /// Creates a discovery pointed at the public portal, logging via `tracing`
    /// and defaulting the end year from the system clock.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            portal_base: DEFAULT_PORTAL_BASE_URL.to_string(),
            sink: Arc::new(TracingSink),
            clock: Arc::new(SystemClock),
            cancel: None,
        }
    }

    /// Points discovery at a different portal root (used by integration tests).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPortalUrl`] unless `base` is an absolute
    /// http(s) URL.
    pub fn with_portal_base(mut self, base: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(base).map_err(|_| ConfigError::InvalidPortalUrl {
            url: base.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidPortalUrl {
                url: base.to_string(),
            });
        }
        self.portal_base = base.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replaces the clock used for the default end year.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Stops scanning before the next year once `flag` is raised.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Listing page URL for one docket and year.
    #[must_use]
    pub fn listing_url(&self, docket: &Docket, year: i32) -> String {
        format!("{}/{year}/{docket}/docsets", self.portal_base)
    }

    /// Collects every unique document link for `docket` over
    /// `start_year..=end_year` (end defaults to the current year).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvertedYearRange`] when the range is inverted.
    /// Unreachable years and malformed links never produce an error.
    pub async fn discover(
        &self,
        docket: &Docket,
        start_year: i32,
        end_year: Option<i32>,
    ) -> Result<LinkIndex, ConfigError> {
        Ok(self
            .discover_with_report(docket, start_year, end_year)
            .await?
            .0)
    }

    /// Like [`discover`](Self::discover), also returning the per-year report.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvertedYearRange`] when the range is inverted.
    pub async fn discover_with_report(
        &self,
        docket: &Docket,
        start_year: i32,
        end_year: Option<i32>,
    ) -> Result<(LinkIndex, DiscoveryReport), ConfigError> {
        let range = YearRange::new(start_year, end_year, self.clock.as_ref())?;
        Ok(self.discover_range(docket, range).await)
    }

    /// Scans an already validated year range.
    #[instrument(skip(self, docket, range), fields(docket = %docket, start = range.start(), end = range.end()))]
    pub async fn discover_range(
        &self,
        docket: &Docket,
        range: YearRange,
    ) -> (LinkIndex, DiscoveryReport) {
        let mut index = LinkIndex::new();
        let mut report = DiscoveryReport::default();

        for year in range.iter() {
            if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                debug!(year, "discovery cancelled");
                report.interrupted = true;
                break;
            }
            report.years.push(self.scan_year(docket, year, &mut index).await);
        }

        self.sink
            .emit(&FetchEvent::DiscoveryComplete { total: index.len() });
        (index, report)
    }

    async fn scan_year(&self, docket: &Docket, year: i32, index: &mut LinkIndex) -> YearSummary {
        let url = self.listing_url(docket, year);
        debug!(year, url = %url, "fetching listing page");

        let page = match self.client.fetch_page(&url).await {
            Ok(page) => page,
            Err(error) => {
                let reason = if error.is_not_found() {
                    format!("no filings for {docket} in {year} (HTTP 404)")
                } else {
                    error.to_string()
                };
                self.sink.emit(&FetchEvent::YearUnavailable {
                    year,
                    url,
                    reason,
                });
                return YearSummary {
                    year,
                    documents: 0,
                    available: false,
                };
            }
        };

        // The page URL is built from a validated base, so this only fails on
        // exotic docket/year formatting.
        let documents = match Url::parse(&url) {
            Ok(page_url) => collect_links(&page, &page_url, index),
            Err(_) => 0,
        };
        self.sink.emit(&FetchEvent::YearScanned { year, documents });
        YearSummary {
            year,
            documents,
            available: true,
        }
    }
}

/// Adds every new document link on `html` to `index`, returning how many
/// records were added.
pub(crate) fn collect_links(html: &str, page_url: &Url, index: &mut LinkIndex) -> usize {
    let mut added = 0;
    for anchor in links::extract_anchors(html) {
        if !links::is_document_link(&anchor.href) {
            continue;
        }
        let Some(doc_id) = links::extract_doc_id(&anchor.href) else {
            trace!(href = %anchor.href, "document link without docID");
            continue;
        };
        if index.contains(&doc_id) {
            trace!(doc_id = %doc_id, "already indexed from an earlier year");
            continue;
        }
        let Ok(source_url) = page_url.join(&anchor.href) else {
            trace!(href = %anchor.href, "unresolvable document link");
            continue;
        };
        let filename = derive_filename(&anchor.text, &doc_id);
        if index.insert(DocumentRecord::new(doc_id, source_url.to_string(), filename)) {
            added += 1;
        }
    }
    added
}
