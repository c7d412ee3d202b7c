//! Docket Fetch Library
//!
//! Discovers the filings published for a utility commission docket and
//! downloads them into a local directory, one year listing page at a time.
//!
//! # Architecture
//!
//! - [`docket`] - Docket identifiers, year ranges and the clock capability
//! - [`events`] - Structured event sink injected into the pipeline
//! - [`http`] - Shared HTTP client and error mapping
//! - [`discovery`] - Year-sliding listing page scraper
//! - [`retrieval`] - Sequential, paced document downloader
//! - [`orchestrator`] - Discovery followed by retrieval
//! - [`db`] and [`tags`] - Spreadsheet tag taxonomy sync into SQLite

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cancel;
pub mod db;
pub mod discovery;
pub mod docket;
pub mod events;
pub mod http;
pub mod orchestrator;
pub mod retrieval;
pub mod tags;
mod user_agent;

// Re-export commonly used types
pub use cancel::CancelFlag;
pub use db::{Database, DbError};
pub use discovery::{
    DEFAULT_PORTAL_BASE_URL, DiscoveryReport, DocumentRecord, LinkDiscovery, LinkIndex,
};
pub use docket::{Clock, ConfigError, Docket, FixedClock, SystemClock, YearRange};
pub use events::{EventSink, FetchEvent, RecordingSink, TracingSink};
pub use http::{HttpClient, HttpError, HttpTimeouts};
pub use orchestrator::{
    DEFAULT_PACE, DocketFetcher, FetchError, FetchRequest, default_destination,
};
pub use retrieval::{
    DocumentRetriever, RetrievalError, RetrievalOptions, RetrievalOutcome, RetrievalReport,
};
pub use tags::{
    TagRow, TagSyncError, TagSyncReport, parse_tag_sheet, read_tag_sheet, sync_tags,
};
