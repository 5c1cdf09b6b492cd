//! # Quote Sources
//!
//! Adapters that fetch buy/sell quotes from third-party providers.
//!
//! - [`traits`]: the [`QuoteSource`] port
//! - [`error`]: [`SourceError`] taxonomy
//! - [`http_client`]: shared reqwest wrapper
//! - [`extract`]: pattern-based extraction rules
//! - [`web_source`]: page-scraping source
//! - [`registry`]: region lookup table

pub mod error;
pub mod extract;
pub mod http_client;
pub mod registry;
pub mod traits;
pub mod web_source;

pub use error::{SourceError, SourceResult};
pub use extract::{Extraction, PriceBand, SpreadFill};
pub use http_client::HttpClient;
pub use registry::SourceRegistry;
pub use traits::{QuoteSource, RawQuote};
pub use web_source::WebQuoteSource;
