//! # Web Quote Source
//!
//! A [`QuoteSource`] that downloads one page and applies an [`Extraction`]
//! rule to it.

use crate::domain::value_objects::SourceId;
use crate::infrastructure::sources::error::SourceResult;
use crate::infrastructure::sources::extract::Extraction;
use crate::infrastructure::sources::http_client::HttpClient;
use crate::infrastructure::sources::traits::{QuoteSource, RawQuote};
use async_trait::async_trait;

/// Scrapes a quote from a public web page.
///
/// The source ID is the page URL.
#[derive(Debug, Clone)]
pub struct WebQuoteSource {
    id: SourceId,
    name: String,
    client: HttpClient,
    extraction: Extraction,
}

impl WebQuoteSource {
    /// Creates a web source for `url`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        client: HttpClient,
        extraction: Extraction,
    ) -> Self {
        Self {
            id: SourceId::new(url),
            name: name.into(),
            client,
            extraction,
        }
    }

    /// Returns the display name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the scraped URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        self.id.as_str()
    }
}

#[async_trait]
impl QuoteSource for WebQuoteSource {
    fn source_id(&self) -> &SourceId {
        &self.id
    }

    fn timeout_ms(&self) -> u64 {
        self.client.timeout_ms()
    }

    async fn fetch(&self) -> SourceResult<RawQuote> {
        let body = self.client.get_text(self.url()).await?;
        let quote = self.extraction.apply(&body)?;
        tracing::debug!(source = %self.name, buy = quote.buy, sell = quote.sell, "extracted quote");
        Ok(quote)
    }
}
