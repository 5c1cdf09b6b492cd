//! # SQLite Persistence
//!
//! sqlx-backed implementations of the repository traits.

pub mod quote_store;

pub use quote_store::SqliteQuoteStore;
