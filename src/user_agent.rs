//! User-Agent strings sent to the commission portal and document proxy.
//!
//! The document proxy rejects requests with empty or library-default agents,
//! so every request carries a browser-like header unless configured otherwise.

/// Browser User-Agent sent on listing page and document requests.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Returns the User-Agent to use when none is configured.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}
