//! # In-Memory Repositories
//!
//! In-memory implementations for testing without database dependencies.
//!
//! - [`InMemoryQuoteStore`]: quote history
//!
//! ## Thread Safety
//!
//! Storage sits behind `Arc<RwLock<_>>`; clones share it.

pub mod quote_store;

pub use quote_store::InMemoryQuoteStore;
