//! # Consensus Arithmetic
//!
//! Decimal helpers behind the average and slippage computations.
//!
//! Prices travel through the system as `f64`, but every derived figure is
//! computed in [`Decimal`] and rounded to [`PRICE_SCALE`] places with
//! round-half-away-from-zero, so results match fixed four-decimal formatting
//! regardless of binary floating point noise.
//!
//! `Decimal` tops out near `7.9e28`. When an input or an intermediate sum
//! leaves that range the `*_price` helpers fall back to `f64` arithmetic
//! instead of saturating.
//!
//! # Examples
//!
//! ```
//! use quote_consensus::domain::value_objects::arithmetic::{mean, mean_price, relative_deviation, round_price};
//! use rust_decimal::Decimal;
//!
//! let average = mean(&[Decimal::new(800, 0), Decimal::new(820, 0)]).unwrap();
//! assert_eq!(average, Decimal::new(810, 0));
//!
//! let slippage = round_price(relative_deviation(Decimal::new(800, 0), average).unwrap());
//! assert_eq!(slippage, Decimal::new(-123, 4));
//!
//! assert_eq!(mean_price(&[1e30, 1e30]), 1e30);
//! ```

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept on every derived price figure.
pub const PRICE_SCALE: u32 = 4;

/// Converts an `f64` into a [`Decimal`].
///
/// Returns `None` for NaN, infinities and magnitudes outside the
/// `Decimal` range.
#[must_use]
pub fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
}

/// Converts a [`Decimal`] back into an `f64`.
#[must_use]
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Rounds to [`PRICE_SCALE`] places, half away from zero.
#[inline]
#[must_use]
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds an `f64` to [`PRICE_SCALE`] places through its decimal form.
///
/// Non-representable inputs are returned unchanged.
#[must_use]
pub fn round_price_f64(value: f64) -> f64 {
    match to_decimal(value) {
        Some(decimal) => to_f64(round_price(decimal)),
        None => value,
    }
}

/// Arithmetic mean of `values`; the mean of an empty slice is zero.
///
/// Returns `None` if the running sum overflows.
#[must_use]
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return Some(Decimal::ZERO);
    }

    let mut total = Decimal::ZERO;
    for value in values {
        total = total.checked_add(*value)?;
    }

    total.checked_div(Decimal::from(values.len()))
}

/// Relative deviation `(value - reference) / reference`.
///
/// A zero reference yields zero instead of a division error. Returns `None`
/// on overflow.
#[must_use]
pub fn relative_deviation(value: Decimal, reference: Decimal) -> Option<Decimal> {
    if reference.is_zero() {
        return Some(Decimal::ZERO);
    }
    value.checked_sub(reference)?.checked_div(reference)
}

/// Rounded arithmetic mean of `prices`.
///
/// Exact in [`Decimal`] when every price and the sum fit, otherwise an
/// `f64` mean that divides before summing so it cannot overflow.
#[must_use]
pub fn mean_price(prices: &[f64]) -> f64 {
    let exact = prices
        .iter()
        .map(|price| to_decimal(*price))
        .collect::<Option<Vec<_>>>()
        .and_then(|decimals| mean(&decimals));

    match exact {
        Some(average) => to_f64(round_price(average)),
        None => {
            tracing::debug!(count = prices.len(), "decimal overflow, averaging in f64");
            let count = prices.len() as f64;
            round_price_f64(prices.iter().map(|price| price / count).sum())
        }
    }
}

/// Rounded relative deviation of `price` from `average`.
///
/// Zero when `average` is zero.
#[must_use]
pub fn price_deviation(price: f64, average: f64) -> f64 {
    let exact = to_decimal(price)
        .zip(to_decimal(average))
        .and_then(|(price, average)| relative_deviation(price, average));

    match exact {
        Some(deviation) => to_f64(round_price(deviation)),
        None if average == 0.0 => 0.0,
        None => round_price_f64((price - average) / average),
    }
}

/// Rounded signed difference `price - average`.
#[must_use]
pub fn price_difference(price: f64, average: f64) -> f64 {
    let exact = to_decimal(price)
        .zip(to_decimal(average))
        .and_then(|(price, average)| price.checked_sub(average));

    match exact {
        Some(diff) => to_f64(round_price(diff)),
        None => round_price_f64(price - average),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    mod rounding {
        use super::*;

        #[test]
        fn midpoint_rounds_away_from_zero() {
            assert_eq!(round_price(dec("1.00005")), dec("1.0001"));
            assert_eq!(round_price(dec("-1.00005")), dec("-1.0001"));
        }

        #[test]
        fn below_midpoint_rounds_toward_zero() {
            assert_eq!(round_price(dec("1.00004")), dec("1.0000"));
        }

        #[test]
        fn f64_rounding_uses_decimal_form() {
            assert_eq!(round_price_f64(5.123456), 5.1235);
            assert_eq!(round_price_f64(1.0), 1.0);
        }

        #[test]
        fn f64_rounding_passes_through_nan() {
            assert!(round_price_f64(f64::NAN).is_nan());
        }
    }

    mod conversion {
        use super::*;

        #[test]
        fn rejects_non_finite() {
            assert!(to_decimal(f64::NAN).is_none());
            assert!(to_decimal(f64::INFINITY).is_none());
            assert!(to_decimal(f64::NEG_INFINITY).is_none());
        }

        #[test]
        fn keeps_simple_values_exact() {
            assert_eq!(to_decimal(850.25).unwrap(), dec("850.25"));
        }
    }

    mod mean {
        use super::*;

        #[test]
        fn empty_is_zero() {
            assert_eq!(super::super::mean(&[]), Some(Decimal::ZERO));
        }

        #[test]
        fn single_value_is_itself() {
            assert_eq!(super::super::mean(&[dec("5.4321")]), Some(dec("5.4321")));
        }

        #[test]
        fn averages_values() {
            let values = [dec("850"), dec("860"), dec("871")];
            assert_eq!(round_price(super::super::mean(&values).unwrap()), dec("860.3333"));
        }

        #[test]
        fn overflowing_sum_is_none() {
            let values = [Decimal::MAX, Decimal::ONE];
            assert!(super::super::mean(&values).is_none());
        }
    }

    mod deviation {
        use super::*;

        #[test]
        fn zero_reference_is_zero() {
            assert_eq!(relative_deviation(dec("10"), Decimal::ZERO), Some(Decimal::ZERO));
        }

        #[test]
        fn symmetric_around_reference() {
            let below = round_price(relative_deviation(dec("800"), dec("810")).unwrap());
            let above = round_price(relative_deviation(dec("820"), dec("810")).unwrap());
            assert_eq!(below, dec("-0.0123"));
            assert_eq!(above, dec("0.0123"));
        }
    }

    mod prices {
        use super::*;

        fn close(actual: f64, expected: f64) -> bool {
            ((actual - expected) / expected).abs() < 1e-12
        }

        #[test]
        fn exact_within_decimal_range() {
            assert_eq!(mean_price(&[800.0, 820.0]), 810.0);
            assert_eq!(mean_price(&[1.0, 1.0, 2.0]), 1.3333);
            assert_eq!(mean_price(&[]), 0.0);
        }

        #[test]
        fn sum_past_decimal_max_falls_back() {
            let average = mean_price(&[5e28, 5e28]);
            assert!(close(average, 5e28), "got {average}");
        }

        #[test]
        fn prices_past_decimal_range_fall_back() {
            assert_eq!(mean_price(&[1e30, 1e30]), 1e30);
            assert!(close(mean_price(&[f64::MAX, f64::MAX]), f64::MAX));
        }

        #[test]
        fn deviation_and_difference() {
            assert_eq!(price_deviation(800.0, 810.0), -0.0123);
            assert_eq!(price_deviation(800.0, 0.0), 0.0);
            assert_eq!(price_difference(800.0, 810.0), -10.0);
        }

        #[test]
        fn deviation_beyond_decimal_range() {
            assert_eq!(price_deviation(1e30, 1e30), 0.0);
            assert_eq!(price_deviation(3e30, 2e30), 0.5);
            assert_eq!(price_difference(1e30, 1e30), 0.0);
        }
    }
}
