//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`SourceId`]: URL-based quote source identifier
//!
//! ## Arithmetic
//!
//! - [`mean_price`], [`price_deviation`], [`price_difference`]: rounded
//!   consensus figures, exact in Decimal with an `f64` fallback
//!
//! ## Domain Enums
//!
//! - [`Region`]: Currency region

pub mod arithmetic;
pub mod enums;
pub mod ids;
pub mod timestamp;

pub use arithmetic::{
    PRICE_SCALE, mean, mean_price, price_deviation, price_difference, relative_deviation,
    round_price, to_decimal, to_f64,
};
pub use enums::{ParseEnumError, Region};
pub use ids::SourceId;
pub use timestamp::Timestamp;
