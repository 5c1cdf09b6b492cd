//! # Retrying Fetcher
//!
//! Bounded retry around a single quote source call.
//!
//! [`RetryingFetcher::fetch`] calls a [`QuoteSource`] under its own timeout,
//! validates the result into a [`Quote`], and on failure sleeps according to
//! the [`Backoff`] before trying again. Once attempts run out the last error
//! is returned as a [`SourceFailure`]; nothing escapes as a panic or a
//! transport error type.
//!
//! # Examples
//!
//! ```
//! use quote_consensus::application::services::retry::{Backoff, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(2, Backoff::linear(Duration::from_secs(1)));
//! assert_eq!(policy.backoff().delay(1), Duration::from_secs(1));
//! assert_eq!(policy.backoff().delay(2), Duration::from_secs(2));
//!
//! // Zero attempts is clamped to one.
//! assert_eq!(RetryPolicy::new(0, Backoff::default()).max_attempts(), 1);
//! ```

use crate::domain::entities::aggregate::SourceFailure;
use crate::domain::entities::quote::Quote;
use crate::domain::value_objects::Timestamp;
use crate::infrastructure::sources::error::SourceError;
use crate::infrastructure::sources::traits::QuoteSource;
use std::time::Duration;
use tokio::time::timeout;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base * attempt` after the n-th failed attempt.
    Linear {
        /// Delay after the first failure.
        base: Duration,
    },
    /// The same delay after every failure.
    Fixed {
        /// Delay between attempts.
        delay: Duration,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Linear {
            base: Duration::from_secs(1),
        }
    }
}

impl Backoff {
    /// Creates a linear backoff.
    #[must_use]
    pub const fn linear(base: Duration) -> Self {
        Self::Linear { base }
    }

    /// Creates a fixed backoff.
    #[must_use]
    pub const fn fixed(delay: Duration) -> Self {
        Self::Fixed { delay }
    }

    /// Returns the delay after the given failed attempt (1-based).
    #[must_use]
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Linear { base } => base.saturating_mul(attempt),
            Self::Fixed { delay } => delay,
        }
    }
}

/// Retry policy for one source call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Backoff::default())
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` below one is raised to one.
    #[must_use]
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Returns the total number of attempts, including the first.
    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the backoff schedule.
    #[inline]
    #[must_use]
    pub fn backoff(&self) -> Backoff {
        self.backoff
    }
}

/// Runs a source with the configured [`RetryPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryingFetcher {
    policy: RetryPolicy,
}

impl RetryingFetcher {
    /// Creates a fetcher.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Returns the policy.
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches one validated quote from `source`.
    ///
    /// Each attempt is bounded by `source.timeout_ms()`. A raw quote that
    /// fails validation counts as a failed attempt.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceFailure`] carrying the last error message and the
    /// number of attempts once every attempt has failed.
    pub async fn fetch(&self, source: &dyn QuoteSource) -> Result<Quote, SourceFailure> {
        let max_attempts = self.policy.max_attempts;
        let limit = Duration::from_millis(source.timeout_ms());
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);

            let outcome = match timeout(limit, source.fetch()).await {
                Ok(Ok(raw)) => raw.into_quote(source.source_id().clone(), Timestamp::now()),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(SourceError::timeout_with_duration(
                    "source did not answer in time",
                    source.timeout_ms(),
                )),
            };

            let error = match outcome {
                Ok(quote) => return Ok(quote),
                Err(e) => e,
            };

            tracing::warn!(
                source = %source.source_id(),
                attempt,
                max_attempts,
                error = %error,
                "quote fetch attempt failed"
            );

            if attempt >= max_attempts {
                return Err(SourceFailure::new(
                    source.source_id().clone(),
                    error.to_string(),
                    attempt,
                ));
            }

            tokio::time::sleep(self.policy.backoff.delay(attempt)).await;
        }
    }
}
