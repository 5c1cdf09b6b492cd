//! # Application Services
//!
//! Services that orchestrate domain logic and infrastructure.
//!
//! - [`RetryingFetcher`]: bounded retry around one source call
//! - [`QuoteAggregationEngine`]: concurrent quote collection and consensus
//! - [`QuoteCache`]: per-region memoization of aggregation results
//! - [`PersistenceQueue`]: fire-and-forget quote persistence
//! - [`QuoteService`]: query facade used by the API

pub mod persistence;
pub mod quote_aggregation;
pub mod quote_cache;
pub mod quote_service;
pub mod retry;

pub use persistence::{PersistBatch, PersistenceQueue, spawn_persistence_worker};
pub use quote_aggregation::{AggregationError, AggregationResult, QuoteAggregationEngine};
pub use quote_cache::{CacheEntry, QuoteCache};
pub use quote_service::{DEFAULT_HISTORY_LIMIT, QuoteService};
pub use retry::{Backoff, RetryPolicy, RetryingFetcher};
