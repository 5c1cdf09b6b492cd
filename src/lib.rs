//! # Quote Consensus
//!
//! Multi-source exchange-rate quotes reconciled into one consensus view.
//!
//! For the active region (`ARS` or `BRL`) the crate fetches buy/sell quotes
//! from several independent web sources concurrently, retries each source a
//! bounded number of times, and averages whatever succeeded. The result is
//! cached per region, exposed over a small REST API together with per-source
//! slippage, and appended to a SQLite history in the background.
//!
//! # Architecture
//!
//! - [`domain`]: quotes, aggregate results and slippage math
//! - [`application`]: retry, aggregation, cache, persistence queue and the
//!   [`QuoteService`](application::services::QuoteService) facade
//! - [`infrastructure`]: HTTP quote sources and quote stores
//! - [`api`]: axum REST endpoints
//! - [`config`]: layered configuration and logging setup
//!
//! # Examples
//!
//! ```
//! use quote_consensus::domain::entities::{AggregateResult, Quote};
//! use quote_consensus::domain::value_objects::{Region, SourceId};
//!
//! let quotes = vec![
//!     Quote::observe(SourceId::new("a"), 800.0, 850.0).unwrap(),
//!     Quote::observe(SourceId::new("b"), 820.0, 860.0).unwrap(),
//! ];
//! let result = AggregateResult::compute(Region::Ars, quotes, vec![]);
//!
//! assert_eq!(result.average_buy(), 810.0);
//! assert_eq!(result.slippage()[0].buy_slippage(), -0.0123);
//! ```

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
