//! # Infrastructure Layer
//!
//! Adapters to the outside world: quote sources over HTTP and quote
//! persistence.

pub mod persistence;
pub mod sources;
