//! # Application Errors
//!
//! Error types for the application layer.
//!
//! # Error Hierarchy
//!
//! ```text
//! ApplicationError
//! ├── Aggregation(AggregationError) - No sources, or every source failed
//! ├── InvalidRegion(String)         - Unknown or unconfigured region
//! ├── Repository(RepositoryError)   - Quote history read failures
//! └── Internal(String)              - Anything else
//! ```
//!
//! # Examples
//!
//! ```
//! use quote_consensus::application::error::ApplicationError;
//!
//! let err = ApplicationError::invalid_region("EUR");
//! assert!(err.is_invalid_region());
//! assert_eq!(err.to_string(), "invalid region: EUR");
//! ```

use crate::application::services::quote_aggregation::AggregationError;
use crate::infrastructure::persistence::traits::RepositoryError;
use thiserror::Error;

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Aggregation failed.
    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    /// The region is not recognized or has no sources.
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    /// Quote store error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Creates an invalid region error.
    #[must_use]
    pub fn invalid_region(value: impl Into<String>) -> Self {
        Self::InvalidRegion(value.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if every source of the region failed.
    #[must_use]
    pub fn is_all_sources_failed(&self) -> bool {
        matches!(self, Self::Aggregation(e) if e.is_all_sources_failed())
    }

    /// Returns true if this is an invalid region error.
    #[must_use]
    pub fn is_invalid_region(&self) -> bool {
        matches!(self, Self::InvalidRegion(_))
    }

    /// Returns true if this is a repository error.
    #[must_use]
    pub fn is_repository(&self) -> bool {
        matches!(self, Self::Repository(_))
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::aggregate::SourceFailure;
    use crate::domain::value_objects::{Region, SourceId};

    #[test]
    fn aggregation_error_is_transparent() {
        let err: ApplicationError = AggregationError::NoSourcesForRegion(Region::Brl).into();
        assert_eq!(err.to_string(), "no quote sources registered for region BRL");
        assert!(!err.is_all_sources_failed());
    }

    #[test]
    fn all_sources_failed_predicate() {
        let err: ApplicationError = AggregationError::AllSourcesFailed {
            region: Region::Ars,
            failures: vec![SourceFailure::new(SourceId::new("a"), "timeout", 2)],
        }
        .into();
        assert!(err.is_all_sources_failed());
        assert!(!err.is_repository());
    }

    #[test]
    fn repository_error_converts() {
        let err: ApplicationError = RepositoryError::connection("pool closed").into();
        assert!(err.is_repository());
        assert!(err.to_string().contains("pool closed"));
    }

    #[test]
    fn internal_error() {
        let err = ApplicationError::internal("bug");
        assert_eq!(err.to_string(), "internal error: bug");
        assert!(!err.is_invalid_region());
    }
}
