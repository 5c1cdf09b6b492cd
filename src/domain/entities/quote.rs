//! # Quote Entity
//!
//! Represents a buy/sell exchange-rate observation from one source.
//!
//! A [`Quote`] only exists when both prices are present, finite and strictly
//! positive. A partially parsed page never becomes a quote; it is reported as
//! a source failure instead.
//!
//! # Examples
//!
//! ```
//! use quote_consensus::domain::entities::quote::Quote;
//! use quote_consensus::domain::value_objects::SourceId;
//!
//! let quote = Quote::observe(SourceId::new("https://www.dolarhoy.com"), 1180.0, 1210.0).unwrap();
//! assert_eq!(quote.buy_price(), 1180.0);
//! assert!(quote.spread() > 0.0);
//!
//! assert!(Quote::observe(SourceId::new("x"), 0.0, 1210.0).is_err());
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{SourceId, Timestamp};
use serde::Serialize;
use std::fmt;

/// A validated buy/sell quote.
///
/// # Invariants
///
/// - `buy_price` and `sell_price` are finite and strictly positive
/// - Immutable after construction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    /// URL of the source that produced the quote.
    source: SourceId,
    /// Price at which the source buys dollars.
    buy_price: f64,
    /// Price at which the source sells dollars.
    sell_price: f64,
    /// When the quote was fetched.
    observed_at: Timestamp,
}

impl Quote {
    /// Creates a quote with validation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPrice` if either price is NaN, infinite,
    /// zero or negative.
    pub fn new(
        source: SourceId,
        buy_price: f64,
        sell_price: f64,
        observed_at: Timestamp,
    ) -> DomainResult<Self> {
        Self::validate_price("buy", buy_price)?;
        Self::validate_price("sell", sell_price)?;

        Ok(Self {
            source,
            buy_price,
            sell_price,
            observed_at,
        })
    }

    /// Creates a quote observed now.
    ///
    /// # Errors
    ///
    /// Same as [`Quote::new`].
    pub fn observe(source: SourceId, buy_price: f64, sell_price: f64) -> DomainResult<Self> {
        Self::new(source, buy_price, sell_price, Timestamp::now())
    }

    fn validate_price(side: &str, price: f64) -> DomainResult<()> {
        if !price.is_finite() {
            return Err(DomainError::invalid_price(format!(
                "{side} price must be finite, got {price}"
            )));
        }
        if price <= 0.0 {
            return Err(DomainError::invalid_price(format!(
                "{side} price must be positive, got {price}"
            )));
        }
        Ok(())
    }

    /// Returns the source identifier.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Returns the buy price.
    #[inline]
    #[must_use]
    pub fn buy_price(&self) -> f64 {
        self.buy_price
    }

    /// Returns the sell price.
    #[inline]
    #[must_use]
    pub fn sell_price(&self) -> f64 {
        self.sell_price
    }

    /// Returns when the quote was observed.
    #[inline]
    #[must_use]
    pub fn observed_at(&self) -> Timestamp {
        self.observed_at
    }

    /// Returns `sell_price - buy_price`.
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.sell_price - self.buy_price
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quote({}: buy {} / sell {})",
            self.source, self.buy_price, self.sell_price
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn source() -> SourceId {
        SourceId::new("https://example.com")
    }

    mod construction {
        use super::*;

        #[test]
        fn valid_prices() {
            let quote = Quote::observe(source(), 800.0, 850.0).unwrap();
            assert_eq!(quote.buy_price(), 800.0);
            assert_eq!(quote.sell_price(), 850.0);
            assert_eq!(quote.source().as_str(), "https://example.com");
        }

        #[test]
        fn rejects_zero_and_negative() {
            assert!(Quote::observe(source(), 0.0, 850.0).is_err());
            assert!(Quote::observe(source(), 800.0, -1.0).is_err());
        }

        #[test]
        fn rejects_non_finite() {
            assert!(Quote::observe(source(), f64::NAN, 850.0).is_err());
            assert!(Quote::observe(source(), 800.0, f64::INFINITY).is_err());
        }

        #[test]
        fn accepts_any_finite_positive_magnitude() {
            let quote = Quote::observe(source(), 1e30, 1e30).unwrap();
            assert_eq!(quote.buy_price(), 1e30);

            assert!(Quote::observe(source(), f64::MIN_POSITIVE, f64::MAX).is_ok());
        }

        #[test]
        fn invalid_price_is_domain_error() {
            let err = Quote::observe(source(), -5.0, 850.0).unwrap_err();
            assert!(matches!(err, DomainError::InvalidPrice(_)));
        }

        #[test]
        fn error_names_the_side() {
            let err = Quote::observe(source(), 800.0, 0.0).unwrap_err();
            assert!(err.to_string().contains("sell"));
        }
    }

    mod accessors {
        use super::*;

        #[test]
        fn spread_is_sell_minus_buy() {
            let quote = Quote::observe(source(), 800.0, 850.0).unwrap();
            assert_eq!(quote.spread(), 50.0);
        }

        #[test]
        fn serializes_field_names() {
            let quote = Quote::observe(source(), 800.0, 850.0).unwrap();
            let json = serde_json::to_value(&quote).unwrap();
            assert_eq!(json["buy_price"], 800.0);
            assert_eq!(json["sell_price"], 850.0);
            assert_eq!(json["source"], "https://example.com");
            assert!(json["observed_at"].is_string());
        }
    }
}
