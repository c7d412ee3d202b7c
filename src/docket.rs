//! Docket identifiers, filing-year ranges and the clock used to default them.

use std::fmt;

use chrono::Datelike;
use thiserror::Error;

/// Configuration errors surfaced before any network traffic happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Docket identifiers are non-empty ASCII digit strings.
    #[error("invalid docket '{value}': expected digits only (e.g. 220066)")]
    InvalidDocket {
        /// The rejected input.
        value: String,
    },

    /// The end year precedes the start year.
    #[error("invalid year range: end year {end} is before start year {start}")]
    InvertedYearRange {
        /// First year of the requested range.
        start: i32,
        /// Last year of the requested range.
        end: i32,
    },

    /// The listing portal base URL cannot be parsed.
    #[error("invalid portal base URL: {url}")]
    InvalidPortalUrl {
        /// The rejected base URL.
        url: String,
    },
}

/// A regulatory case identifier, e.g. `220066`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Docket(String);

impl Docket {
    /// Validates and wraps a docket identifier.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDocket`] when the value is empty or
    /// contains anything other than ASCII digits.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ConfigError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::InvalidDocket {
                value: value.as_ref().to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Docket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Docket {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Source of the current calendar year.
pub trait Clock: Send + Sync {
    /// Returns the current calendar year.
    fn current_year(&self) -> i32;
}

/// Wall-clock implementation backed by the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_year(&self) -> i32 {
        chrono::Local::now().year()
    }
}

/// Clock pinned to a fixed year.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i32);

impl Clock for FixedClock {
    fn current_year(&self) -> i32 {
        self.0
    }
}

/// An inclusive, ascending range of filing years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    /// Builds a range, defaulting the end year to `clock`'s current year.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvertedYearRange`] when the (resolved) end
    /// year precedes `start`.
    pub fn new(start: i32, end: Option<i32>, clock: &dyn Clock) -> Result<Self, ConfigError> {
        let end = end.unwrap_or_else(|| clock.current_year());
        if end < start {
            return Err(ConfigError::InvertedYearRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// First year in the range.
    #[must_use]
    pub fn start(&self) -> i32 {
        self.start
    }

    /// Last year in the range.
    #[must_use]
    pub fn end(&self) -> i32 {
        self.end
    }

    /// Number of years covered.
    #[must_use]
    pub fn len(&self) -> usize {
        let years = i64::from(self.end) - i64::from(self.start) + 1;
        usize::try_from(years).unwrap_or(usize::MAX)
    }

    /// Always false; a valid range covers at least one year.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates the years in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }
}
