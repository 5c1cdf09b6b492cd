//! # Quote Source Trait
//!
//! Port definition for quote source integrations.
//!
//! Every provider of exchange-rate quotes implements [`QuoteSource`]. The
//! aggregation engine only ever sees trait objects, so a scraped web page,
//! a JSON API or an in-process stub are interchangeable.
//!
//! # Examples
//!
//! ```ignore
//! use quote_consensus::infrastructure::sources::traits::{QuoteSource, RawQuote};
//! use quote_consensus::infrastructure::sources::error::SourceResult;
//!
//! #[derive(Debug)]
//! struct FixedSource { id: SourceId }
//!
//! #[async_trait::async_trait]
//! impl QuoteSource for FixedSource {
//!     fn source_id(&self) -> &SourceId { &self.id }
//!     fn timeout_ms(&self) -> u64 { 1_000 }
//!     async fn fetch(&self) -> SourceResult<RawQuote> { Ok(RawQuote::new(800.0, 850.0)) }
//! }
//! ```

use crate::domain::entities::quote::Quote;
use crate::domain::value_objects::{SourceId, Timestamp};
use crate::infrastructure::sources::error::{SourceError, SourceResult};
use async_trait::async_trait;
use std::fmt;

/// Unvalidated buy/sell pair as extracted from a source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawQuote {
    /// Extracted buy price.
    pub buy: f64,
    /// Extracted sell price.
    pub sell: f64,
}

impl RawQuote {
    /// Creates a raw quote.
    #[must_use]
    pub const fn new(buy: f64, sell: f64) -> Self {
        Self { buy, sell }
    }

    /// Validates the pair into a [`Quote`].
    ///
    /// # Errors
    ///
    /// Returns `SourceError::InvalidQuote` if either price is not finite and
    /// strictly positive.
    pub fn into_quote(self, source: SourceId, observed_at: Timestamp) -> SourceResult<Quote> {
        Quote::new(source, self.buy, self.sell, observed_at)
            .map_err(|e| SourceError::invalid_quote(e.to_string()))
    }
}

impl fmt::Display for RawQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buy {} / sell {}", self.buy, self.sell)
    }
}

/// Trait defining the interface for quote sources.
///
/// # Error Handling
///
/// `fetch` returns `SourceResult<RawQuote>`. Implementations map transport
/// and extraction problems to the matching `SourceError` variant and never
/// panic on malformed input.
#[async_trait]
pub trait QuoteSource: Send + Sync + fmt::Debug {
    /// Returns the source ID.
    fn source_id(&self) -> &SourceId;

    /// Returns the timeout in milliseconds for one fetch.
    fn timeout_ms(&self) -> u64;

    /// Performs one fetch of the source's current quote.
    ///
    /// # Errors
    ///
    /// - `SourceError::Timeout` - Request timed out
    /// - `SourceError::Connection` / `SourceError::HttpStatus` - Transport failure
    /// - `SourceError::QuoteNotFound` - Page did not contain both prices
    async fn fetch(&self) -> SourceResult<RawQuote>;
}
