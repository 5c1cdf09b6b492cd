//! # Timestamp Value Object
//!
//! UTC wall-clock instant used to stamp observed quotes and aggregation runs.
//!
//! # Examples
//!
//! ```
//! use quote_consensus::domain::value_objects::timestamp::Timestamp;
//!
//! let observed = Timestamp::from_millis(1_704_067_200_000).unwrap();
//! let later = observed.add_millis(1_500);
//!
//! assert!(later.is_after(&observed));
//! assert_eq!(later.timestamp_millis(), 1_704_067_201_500);
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC timestamp.
///
/// Wraps `chrono::DateTime<Utc>` and serializes as an RFC 3339 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from Unix milliseconds.
    ///
    /// Returns `None` if the value is out of the representable range.
    #[must_use]
    pub fn from_millis(millis: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(millis).single().map(Self)
    }

    /// Creates a timestamp from Unix seconds.
    #[must_use]
    pub fn from_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Returns the Unix timestamp in milliseconds.
    #[inline]
    #[must_use]
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Adds milliseconds to the timestamp (may be negative).
    #[must_use]
    pub fn add_millis(&self, millis: i64) -> Self {
        Self(self.0 + Duration::milliseconds(millis))
    }

    /// Returns true if this timestamp is before another.
    #[inline]
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self.0 < other.0
    }

    /// Returns true if this timestamp is after another.
    #[inline]
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self.0 > other.0
    }

    /// Formats the timestamp as RFC 3339.
    #[must_use]
    pub fn to_iso8601(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Returns the underlying DateTime.
    #[inline]
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}
