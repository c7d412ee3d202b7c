//! HTTP client wrapper shared by discovery and retrieval.
//!
//! One `reqwest::Client` is built per run and reused for every listing page
//! and document request, taking advantage of connection pooling. Listing
//! pages and document bodies use separate per-request timeouts.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::{debug, instrument};
use url::Url;

use super::error::HttpError;
use crate::user_agent;

/// Default connect timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for a whole listing page request.
pub const LISTING_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for a whole document request (headers and body).
pub const DOCUMENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout settings for [`HttpClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// TCP/TLS connect timeout.
    pub connect: Duration,
    /// Listing page request timeout.
    pub listing: Duration,
    /// Document request timeout.
    pub document: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: CONNECT_TIMEOUT,
            listing: LISTING_TIMEOUT,
            document: DOCUMENT_TIMEOUT,
        }
    }
}

/// HTTP client for listing pages and document bodies.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    user_agent: String,
    timeouts: HttpTimeouts,
}

impl HttpClient {
    /// Creates a client with default timeouts and the browser User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Build`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_settings(HttpTimeouts::default(), None)
    }

    /// Creates a client with explicit timeouts and an optional User-Agent override.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Build`] if the TLS backend cannot be initialized.
    pub fn with_settings(
        timeouts: HttpTimeouts,
        user_agent: Option<&str>,
    ) -> Result<Self, HttpError> {
        let user_agent = user_agent
            .map(str::trim)
            .filter(|ua| !ua.is_empty())
            .map_or_else(user_agent::default_user_agent, ToString::to_string);

        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .gzip(true)
            .build()
            .map_err(HttpError::Build)?;

        Ok(Self {
            client,
            user_agent,
            timeouts,
        })
    }

    /// Returns the User-Agent sent with every request.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Fetches a listing page and returns its body as text.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] on invalid URLs, network failures, timeouts and
    /// non-2xx responses.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_page(&self, url: &str) -> Result<String, HttpError> {
        let response = self
            .send(
                url,
                self.timeouts.listing,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .await?;
        let body = response
            .text()
            .await
            .map_err(|e| HttpError::network(url, e))?;
        debug!(bytes = body.len(), "listing page fetched");
        Ok(body)
    }

    /// Issues a document GET and returns the successful response for streaming.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] on invalid URLs, network failures, timeouts and
    /// non-2xx responses.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_document(&self, url: &str) -> Result<reqwest::Response, HttpError> {
        self.send(
            url,
            self.timeouts.document,
            "application/pdf,application/octet-stream;q=0.9,*/*;q=0.8",
        )
        .await
    }

    async fn send(
        &self,
        url: &str,
        timeout: Duration,
        accept: &str,
    ) -> Result<reqwest::Response, HttpError> {
        let parsed = Url::parse(url).map_err(|_| HttpError::invalid_url(url))?;

        let response = self
            .client
            .get(parsed)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, accept)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| HttpError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_http_timeouts_default_values() {
        let timeouts = HttpTimeouts::default();
        assert_eq!(timeouts.connect, Duration::from_secs(10));
        assert_eq!(timeouts.listing, Duration::from_secs(30));
        assert_eq!(timeouts.document, Duration::from_secs(60));
    }

    #[test]
    fn test_http_client_uses_browser_user_agent_by_default() {
        let client = HttpClient::new().unwrap();
        assert_eq!(client.user_agent(), user_agent::BROWSER_USER_AGENT);
    }

    #[test]
    fn test_http_client_blank_user_agent_override_falls_back() {
        let client = HttpClient::with_settings(HttpTimeouts::default(), Some("   ")).unwrap();
        assert_eq!(client.user_agent(), user_agent::BROWSER_USER_AGENT);
    }

    #[tokio::test]
    async fn test_fetch_page_sends_user_agent_and_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/casedocket/2020/200301/docsets"))
            .and(header("user-agent", "docket-test/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            HttpClient::with_settings(HttpTimeouts::default(), Some("docket-test/1.0")).unwrap();
        let body = client
            .fetch_page(&format!("{}/casedocket/2020/200301/docsets", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_fetch_page_maps_404_to_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let err = client
            .fetch_page(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_not_found(), "expected 404, got {err}");
    }

    #[tokio::test]
    async fn test_fetch_document_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"%PDF-1.7".to_vec())
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let timeouts = HttpTimeouts {
            document: Duration::from_millis(200),
            ..HttpTimeouts::default()
        };
        let client = HttpClient::with_settings(timeouts, None).unwrap();
        let err = client
            .fetch_document(&format!("{}/cases/GetDocument", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Timeout { .. }), "got {err}");
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_invalid_url() {
        let client = HttpClient::new().unwrap();
        let err = client.fetch_page("not a url").await.unwrap_err();
        assert!(matches!(err, HttpError::InvalidUrl { .. }));
    }
}
