//! # Domain Errors
//!
//! Validation failures raised while constructing domain entities.

use thiserror::Error;

/// Errors produced by domain validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// A quoted price is missing, non-finite or not positive.
    #[error("invalid price: {0}")]
    InvalidPrice(String),
}

impl DomainError {
    /// Creates an invalid price error.
    #[must_use]
    pub fn invalid_price(message: impl Into<String>) -> Self {
        Self::InvalidPrice(message.into())
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
