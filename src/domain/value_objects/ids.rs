//! # Identifiers
//!
//! String-based identifiers for domain entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a quote source.
///
/// Holds the URL the source is scraped from, which makes it stable for the
/// lifetime of the process and meaningful in reports.
///
/// # Examples
///
/// ```
/// use quote_consensus::domain::value_objects::SourceId;
///
/// let id = SourceId::new("https://www.dolarhoy.com");
/// assert_eq!(id.as_str(), "https://www.dolarhoy.com");
/// assert_eq!(id.to_string(), "https://www.dolarhoy.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Creates a new source identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
