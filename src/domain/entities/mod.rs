//! # Domain Entities
//!
//! - [`Quote`]: Validated buy/sell observation from one source
//! - [`AggregateResult`]: Consensus over one aggregation round, with its
//!   derived [`AverageSummary`] and [`SlippageRecord`]s

pub mod aggregate;
pub mod quote;

pub use aggregate::{AggregateResult, AverageSummary, SlippageRecord, SourceFailure};
pub use quote::Quote;
