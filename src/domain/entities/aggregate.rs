//! # Aggregate Result
//!
//! Consensus view over the quotes collected for one region.
//!
//! An [`AggregateResult`] is built from the quotes that survived a fetch
//! round plus the diagnostics of the sources that did not. Averages are
//! computed once, exactly in `Decimal` where the prices allow it, and
//! rounded to four places; the
//! per-source [`SlippageRecord`]s and the [`AverageSummary`] are derived
//! from those rounded averages on demand.
//!
//! # Examples
//!
//! ```
//! use quote_consensus::domain::entities::aggregate::AggregateResult;
//! use quote_consensus::domain::entities::quote::Quote;
//! use quote_consensus::domain::value_objects::{Region, SourceId};
//!
//! let quotes = vec![
//!     Quote::observe(SourceId::new("a"), 800.0, 850.0).unwrap(),
//!     Quote::observe(SourceId::new("b"), 820.0, 860.0).unwrap(),
//! ];
//! let result = AggregateResult::compute(Region::Ars, quotes, Vec::new());
//!
//! assert_eq!(result.source_count(), 2);
//! assert_eq!(result.average_buy(), 810.0);
//! assert_eq!(result.slippage()[0].buy_slippage(), -0.0123);
//! ```

use crate::domain::entities::quote::Quote;
use crate::domain::value_objects::arithmetic::{mean_price, price_deviation, price_difference};
use crate::domain::value_objects::{Region, SourceId, Timestamp};
use serde::Serialize;
use std::fmt;

/// Terminal failure of one source after all retry attempts.
///
/// Carried as a non-fatal diagnostic on [`AggregateResult`] and inside
/// `AllSourcesFailed` errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    /// The failing source.
    pub source: SourceId,
    /// Message of the last error observed.
    pub message: String,
    /// Number of attempts made.
    pub attempts: u32,
}

impl SourceFailure {
    /// Creates a new failure record.
    #[must_use]
    pub fn new(source: SourceId, message: impl Into<String>, attempts: u32) -> Self {
        Self {
            source,
            message: message.into(),
            attempts,
        }
    }
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed after {} attempt(s): {}",
            self.source, self.attempts, self.message
        )
    }
}

/// Consensus over the quotes of one aggregation round.
///
/// # Invariants
///
/// - `quotes` follow the source registration order
/// - `average_buy`/`average_sell` are rounded to four decimal places
/// - `source_count == quotes.len()`
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    region: Region,
    quotes: Vec<Quote>,
    average_buy: f64,
    average_sell: f64,
    computed_at: Timestamp,
    failures: Vec<SourceFailure>,
}

impl AggregateResult {
    /// Computes the consensus for the given quotes.
    ///
    /// Buy and sell averages are independent means. An empty quote list
    /// yields zero averages.
    #[must_use]
    pub fn compute(region: Region, quotes: Vec<Quote>, failures: Vec<SourceFailure>) -> Self {
        let buys: Vec<f64> = quotes.iter().map(Quote::buy_price).collect();
        let sells: Vec<f64> = quotes.iter().map(Quote::sell_price).collect();

        Self {
            region,
            average_buy: mean_price(&buys),
            average_sell: mean_price(&sells),
            quotes,
            computed_at: Timestamp::now(),
            failures,
        }
    }

    /// Returns the region the result was computed for.
    #[inline]
    #[must_use]
    pub fn region(&self) -> Region {
        self.region
    }

    /// Returns the accepted quotes in source order.
    #[inline]
    #[must_use]
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    /// Returns the number of sources that contributed a quote.
    #[inline]
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.quotes.len()
    }

    /// Returns the rounded average buy price.
    #[inline]
    #[must_use]
    pub fn average_buy(&self) -> f64 {
        self.average_buy
    }

    /// Returns the rounded average sell price.
    #[inline]
    #[must_use]
    pub fn average_sell(&self) -> f64 {
        self.average_sell
    }

    /// Returns when the aggregation completed.
    #[inline]
    #[must_use]
    pub fn computed_at(&self) -> Timestamp {
        self.computed_at
    }

    /// Returns the sources that failed during the round.
    #[inline]
    #[must_use]
    pub fn failures(&self) -> &[SourceFailure] {
        &self.failures
    }

    /// Returns the average summary.
    #[must_use]
    pub fn average_summary(&self) -> AverageSummary {
        AverageSummary {
            average_buy: self.average_buy(),
            average_sell: self.average_sell(),
            source_count: self.source_count(),
            computed_at: self.computed_at,
        }
    }

    /// Returns one slippage record per quote, in quote order.
    #[must_use]
    pub fn slippage(&self) -> Vec<SlippageRecord> {
        self.quotes
            .iter()
            .map(|quote| SlippageRecord::against(quote, self.average_buy, self.average_sell))
            .collect()
    }
}

/// Deviation of one source's prices from the consensus averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlippageRecord {
    /// Relative buy deviation, `(buy - avg) / avg`.
    #[serde(rename = "buy_price_slippage")]
    buy_slippage: f64,
    /// Relative sell deviation, `(sell - avg) / avg`.
    #[serde(rename = "sell_price_slippage")]
    sell_slippage: f64,
    /// Signed buy difference, `buy - avg`.
    #[serde(rename = "absolute_buy_diff")]
    buy_diff: f64,
    /// Signed sell difference, `sell - avg`.
    #[serde(rename = "absolute_sell_diff")]
    sell_diff: f64,
    source: SourceId,
    #[serde(rename = "timestamp")]
    observed_at: Timestamp,
}

impl SlippageRecord {
    fn against(quote: &Quote, average_buy: f64, average_sell: f64) -> Self {
        let buy = quote.buy_price();
        let sell = quote.sell_price();

        Self {
            buy_slippage: price_deviation(buy, average_buy),
            sell_slippage: price_deviation(sell, average_sell),
            buy_diff: price_difference(buy, average_buy),
            sell_diff: price_difference(sell, average_sell),
            source: quote.source().clone(),
            observed_at: quote.observed_at(),
        }
    }

    /// Returns the relative buy deviation.
    #[inline]
    #[must_use]
    pub fn buy_slippage(&self) -> f64 {
        self.buy_slippage
    }

    /// Returns the relative sell deviation.
    #[inline]
    #[must_use]
    pub fn sell_slippage(&self) -> f64 {
        self.sell_slippage
    }

    /// Returns the signed buy difference.
    #[inline]
    #[must_use]
    pub fn buy_diff(&self) -> f64 {
        self.buy_diff
    }

    /// Returns the signed sell difference.
    #[inline]
    #[must_use]
    pub fn sell_diff(&self) -> f64 {
        self.sell_diff
    }

    /// Returns the source of the underlying quote.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Returns when the underlying quote was observed.
    #[inline]
    #[must_use]
    pub fn observed_at(&self) -> Timestamp {
        self.observed_at
    }
}

/// Averages of one aggregation round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageSummary {
    /// Rounded average buy price.
    #[serde(rename = "average_buy_price")]
    pub average_buy: f64,
    /// Rounded average sell price.
    #[serde(rename = "average_sell_price")]
    pub average_sell: f64,
    /// Number of contributing sources.
    pub source_count: usize,
    /// When the aggregation completed.
    #[serde(rename = "timestamp")]
    pub computed_at: Timestamp,
}
