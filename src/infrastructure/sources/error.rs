//! # Source Errors
//!
//! Error types for quote source operations.
//!
//! A [`SourceError`] describes one failed fetch attempt. The retrying fetcher
//! turns the last one into a `SourceFailure` once attempts run out.
//!
//! # Examples
//!
//! ```
//! use quote_consensus::infrastructure::sources::error::SourceError;
//!
//! let error = SourceError::timeout_with_duration("no response", 10_000);
//! assert!(error.is_retryable());
//!
//! let error = SourceError::quote_not_found("buy price missing");
//! assert!(!error.is_retryable());
//! ```

use thiserror::Error;

/// Error type for quote source operations.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Request timed out.
    #[error("source timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
        /// Timeout duration in milliseconds.
        timeout_ms: Option<u64>,
    },

    /// Network or connection error.
    #[error("source connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// The source answered with a non-success HTTP status.
    #[error("source returned HTTP {status}: {message}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("source rate limit exceeded: {message}")]
    RateLimited {
        /// Error message.
        message: String,
        /// Retry after duration in milliseconds.
        retry_after_ms: Option<u64>,
    },

    /// The page was fetched but no quote could be extracted from it.
    #[error("quote not found: {message}")]
    QuoteNotFound {
        /// Error message.
        message: String,
    },

    /// Extracted numbers do not form a valid quote.
    #[error("invalid quote: {message}")]
    InvalidQuote {
        /// Error message.
        message: String,
    },

    /// Internal error.
    #[error("source internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl SourceError {
    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            timeout_ms: None,
        }
    }

    /// Creates a timeout error with duration.
    #[must_use]
    pub fn timeout_with_duration(message: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            message: message.into(),
            timeout_ms: Some(timeout_ms),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an HTTP status error.
    #[must_use]
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            message: message.into(),
        }
    }

    /// Creates a rate limited error.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after_ms: None,
        }
    }

    /// Creates a rate limited error with retry duration.
    #[must_use]
    pub fn rate_limited_with_retry(message: impl Into<String>, retry_after_ms: u64) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after_ms: Some(retry_after_ms),
        }
    }

    /// Creates a quote not found error.
    #[must_use]
    pub fn quote_not_found(message: impl Into<String>) -> Self {
        Self::QuoteNotFound {
            message: message.into(),
        }
    }

    /// Creates an invalid quote error.
    #[must_use]
    pub fn invalid_quote(message: impl Into<String>) -> Self {
        Self::InvalidQuote {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error is transient.
    ///
    /// Server-side statuses (5xx) count as transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connection { .. } | Self::RateLimited { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if the page was reachable but unusable.
    #[must_use]
    pub fn is_extraction_error(&self) -> bool {
        matches!(self, Self::QuoteNotFound { .. } | Self::InvalidQuote { .. })
    }

    /// Returns the retry delay in milliseconds, if applicable.
    #[must_use]
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }
}

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;
