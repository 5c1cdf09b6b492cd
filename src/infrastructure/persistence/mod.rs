//! # Persistence Layer
//!
//! Durable history of observed quotes.
//!
//! ## Repository Traits (Ports)
//!
//! - [`QuoteStore`]: append-only quote log
//!
//! ## Implementations
//!
//! - `in_memory`: In-memory implementation for tests
//! - `sqlite`: SQLite implementation via sqlx

pub mod in_memory;
pub mod sqlite;
pub mod traits;

pub use in_memory::InMemoryQuoteStore;
pub use sqlite::SqliteQuoteStore;
pub use traits::{QuoteStore, RepositoryError, RepositoryResult, StoredQuote};
