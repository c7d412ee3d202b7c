//! HTTP plumbing shared by listing-page discovery and document retrieval.
//!
//! Every request carries a browser-like User-Agent and its own timeout; there
//! is no retry layer, failures are reported to the caller as [`HttpError`].

mod client;
mod error;

pub use client::{CONNECT_TIMEOUT, DOCUMENT_TIMEOUT, HttpClient, HttpTimeouts, LISTING_TIMEOUT};
pub use error::HttpError;

pub use crate::user_agent::BROWSER_USER_AGENT;
