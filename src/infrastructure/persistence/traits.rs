//! # Repository Traits
//!
//! Port definitions for persistence abstraction.
//!
//! - [`QuoteStore`]: append-only log of observed quotes
//!
//! # Examples
//!
//! ```ignore
//! use quote_consensus::infrastructure::persistence::traits::QuoteStore;
//!
//! async fn latest(store: &impl QuoteStore) {
//!     let rows = store.history(Region::Ars, 10).await?;
//!     println!("{} stored quotes", rows.len());
//! }
//! ```

use crate::domain::entities::quote::Quote;
use crate::domain::value_objects::{Region, SourceId, Timestamp};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error type for repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query error.
    #[error("Query error: {0}")]
    Query(String),

    /// Stored data could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepositoryError {
    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error.
    #[must_use]
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a connection error.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// A persisted quote observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredQuote {
    /// Row identifier, increasing with insertion order.
    pub id: i64,
    /// Region the quote was collected for.
    pub region: Region,
    /// Source that produced the quote.
    pub source: SourceId,
    /// Buy price.
    pub buy_price: f64,
    /// Sell price.
    pub sell_price: f64,
    /// When the quote was observed.
    #[serde(rename = "timestamp")]
    pub observed_at: Timestamp,
}

/// Append-only store of observed quotes.
///
/// The live read path never waits on this store; writes arrive through the
/// background persistence queue.
#[async_trait]
pub trait QuoteStore: Send + Sync + fmt::Debug {
    /// Appends one observation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Query` if the write fails.
    async fn append(&self, region: Region, quote: &Quote) -> RepositoryResult<()>;

    /// Returns up to `limit` observations of `region`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Query` if the read fails, or
    /// `RepositoryError::Serialization` if a row cannot be decoded.
    async fn history(&self, region: Region, limit: u32) -> RepositoryResult<Vec<StoredQuote>>;

    /// Counts all stored observations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Query` if the read fails.
    async fn count(&self) -> RepositoryResult<u64>;
}
