//! # Quote Extraction
//!
//! Pattern-based rules that turn a fetched page into a [`RawQuote`].
//!
//! Sources publish prices in wildly different shapes: labeled buy/sell
//! cells, loose lists of numbers, or a single mid-market rate. Each shape is
//! one [`Extraction`] variant. Numbers are parsed leniently with
//! [`parse_number`], so `"$ 1.180,50"` and `"1180.50"` read the same.
//!
//! # Examples
//!
//! ```
//! use quote_consensus::infrastructure::sources::extract::{Extraction, parse_number};
//!
//! assert_eq!(parse_number("$ 1.180,50"), Some(1180.5));
//!
//! let rule = Extraction::labeled(r"Compra:\s*([\d.,]+)", r"Venta:\s*([\d.,]+)").unwrap();
//! let quote = rule.apply("Compra: 1.180,50 Venta: 1.220,00").unwrap();
//! assert_eq!(quote.buy, 1180.5);
//! assert_eq!(quote.sell, 1220.0);
//! ```

use crate::domain::value_objects::arithmetic::round_price_f64;
use crate::infrastructure::sources::error::{SourceError, SourceResult};
use crate::infrastructure::sources::traits::RawQuote;
use regex::Regex;

/// Estimates a missing side from the present one with a fixed spread.
///
/// `sell = buy * (1 + pct)` and `buy = sell * (1 - pct)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadFill {
    pct: f64,
}

impl SpreadFill {
    /// Creates a fill rule for the given fractional spread (`0.04` = 4%).
    #[must_use]
    pub const fn new(pct: f64) -> Self {
        Self { pct }
    }

    /// Returns the fractional spread.
    #[inline]
    #[must_use]
    pub const fn pct(&self) -> f64 {
        self.pct
    }

    /// Completes a half-extracted pair; returns `None` if both sides are missing.
    #[must_use]
    pub fn complete(&self, buy: Option<f64>, sell: Option<f64>) -> Option<(f64, f64)> {
        match (buy, sell) {
            (Some(buy), Some(sell)) => Some((buy, sell)),
            (Some(buy), None) => Some((buy, buy * (1.0 + self.pct))),
            (None, Some(sell)) => Some((sell * (1.0 - self.pct), sell)),
            (None, None) => None,
        }
    }
}

/// Open interval of plausible prices; anything outside is ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBand {
    /// Exclusive lower bound.
    pub min: f64,
    /// Exclusive upper bound.
    pub max: f64,
}

impl PriceBand {
    /// Creates a band.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns true if `value` lies strictly inside the band.
    #[inline]
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value > self.min && value < self.max
    }
}

/// Extraction rule for one source.
#[derive(Debug, Clone)]
pub enum Extraction {
    /// One pattern per side; the first capture group holds the number.
    Labeled {
        /// Pattern capturing the buy price.
        buy: Regex,
        /// Pattern capturing the sell price.
        sell: Regex,
    },
    /// Every match of `pattern` is a candidate; the first two inside `band`
    /// are buy and sell in that order.
    Banded {
        /// Pattern whose first capture group (or whole match) is a number.
        pattern: Regex,
        /// Plausible price range.
        band: PriceBand,
        /// Estimation of a missing side, if the source allows it.
        fill: Option<SpreadFill>,
    },
    /// A single rate widened symmetrically into buy and sell.
    MidRate {
        /// Pattern capturing the rate.
        pattern: Regex,
        /// Fractional half-spread applied on each side.
        spread: f64,
        /// Invert rates below one (quoted in the wrong direction).
        invert_below_one: bool,
    },
}

impl Extraction {
    /// Creates a labeled rule.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Internal` if a pattern does not compile.
    pub fn labeled(buy: &str, sell: &str) -> SourceResult<Self> {
        Ok(Self::Labeled {
            buy: compile(buy)?,
            sell: compile(sell)?,
        })
    }

    /// Creates a banded rule.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Internal` if the pattern does not compile.
    pub fn banded(pattern: &str, band: PriceBand, fill: Option<SpreadFill>) -> SourceResult<Self> {
        Ok(Self::Banded {
            pattern: compile(pattern)?,
            band,
            fill,
        })
    }

    /// Creates a mid-rate rule.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Internal` if the pattern does not compile.
    pub fn mid_rate(pattern: &str, spread: f64, invert_below_one: bool) -> SourceResult<Self> {
        Ok(Self::MidRate {
            pattern: compile(pattern)?,
            spread,
            invert_below_one,
        })
    }

    /// Applies the rule to a page body.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::QuoteNotFound` if the page does not yield both
    /// prices under this rule.
    pub fn apply(&self, body: &str) -> SourceResult<RawQuote> {
        match self {
            Self::Labeled { buy, sell } => {
                let buy = first_capture(buy, body)
                    .ok_or_else(|| SourceError::quote_not_found("buy price not found"))?;
                let sell = first_capture(sell, body)
                    .ok_or_else(|| SourceError::quote_not_found("sell price not found"))?;
                Ok(RawQuote::new(buy, sell))
            }
            Self::Banded {
                pattern,
                band,
                fill,
            } => {
                let mut candidates = pattern
                    .captures_iter(body)
                    .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
                    .filter_map(|m| parse_number(m.as_str()))
                    .filter(|value| band.contains(*value));
                let buy = candidates.next();
                let sell = candidates.next();

                let (buy, sell) = match (buy, sell, fill) {
                    (Some(buy), Some(sell), _) => (buy, sell),
                    (buy, sell, Some(fill)) => fill
                        .complete(buy, sell)
                        .ok_or_else(|| SourceError::quote_not_found("no rate inside the price band"))?,
                    _ => {
                        return Err(SourceError::quote_not_found(
                            "fewer than two rates inside the price band",
                        ));
                    }
                };
                Ok(RawQuote::new(round_price_f64(buy), round_price_f64(sell)))
            }
            Self::MidRate {
                pattern,
                spread,
                invert_below_one,
            } => {
                let rate = first_capture(pattern, body)
                    .filter(|rate| *rate > 0.0)
                    .ok_or_else(|| SourceError::quote_not_found("rate not found"))?;
                let mid = if *invert_below_one && rate < 1.0 {
                    1.0 / rate
                } else {
                    rate
                };
                Ok(RawQuote::new(
                    round_price_f64(mid * (1.0 - spread)),
                    round_price_f64(mid * (1.0 + spread)),
                ))
            }
        }
    }
}

fn compile(pattern: &str) -> SourceResult<Regex> {
    Regex::new(pattern)
        .map_err(|e| SourceError::internal(format!("invalid extraction pattern: {}", e)))
}

fn first_capture(pattern: &Regex, body: &str) -> Option<f64> {
    pattern
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| parse_number(m.as_str()))
}

/// Parses a price written with either decimal convention.
///
/// Everything but digits, `.` and `,` is dropped. When both separators
/// appear, the last one is the decimal mark and the other groups
/// thousands. A lone comma is a decimal mark; repeated identical
/// separators group thousands.
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == ',');
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let dots = cleaned.matches('.').count();
    let commas = cleaned.matches(',').count();

    let normalized = match (dots, commas) {
        (0, 0) => cleaned.to_string(),
        (_, 0) if dots > 1 => cleaned.replace('.', ""),
        (_, 0) => cleaned.to_string(),
        (0, 1) => cleaned.replace(',', "."),
        (0, _) => cleaned.replace(',', ""),
        _ => {
            let last_dot = cleaned.rfind('.');
            let last_comma = cleaned.rfind(',');
            if last_comma > last_dot {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}
