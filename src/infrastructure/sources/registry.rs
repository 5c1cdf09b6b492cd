//! # Source Registry
//!
//! Lookup table from [`Region`] to the quote sources active for it.
//!
//! The table is built once at startup and shared read-only afterwards.
//! Sources keep their registration order, which is also the order of the
//! quotes in every aggregation result.
//!
//! # Examples
//!
//! ```
//! use quote_consensus::domain::value_objects::Region;
//! use quote_consensus::infrastructure::sources::http_client::HttpClient;
//! use quote_consensus::infrastructure::sources::registry::SourceRegistry;
//!
//! let client = HttpClient::new(10_000, "Mozilla/5.0").unwrap();
//! let registry = SourceRegistry::reference(&client).unwrap();
//!
//! assert_eq!(registry.sources_for(Region::Ars).len(), 3);
//! assert_eq!(registry.sources_for(Region::Brl).len(), 3);
//! ```

use crate::domain::value_objects::Region;
use crate::infrastructure::sources::error::SourceResult;
use crate::infrastructure::sources::extract::{Extraction, PriceBand, SpreadFill};
use crate::infrastructure::sources::http_client::HttpClient;
use crate::infrastructure::sources::traits::QuoteSource;
use crate::infrastructure::sources::web_source::WebQuoteSource;
use std::collections::HashMap;
use std::sync::Arc;

/// Plausible USD/BRL range used to discard unrelated numbers on a page.
const BRL_BAND: PriceBand = PriceBand::new(1.0, 10.0);

/// Quote sources grouped by region.
#[derive(Debug, Default, Clone)]
pub struct SourceRegistry {
    sources: HashMap<Region, Vec<Arc<dyn QuoteSource>>>,
}

impl SourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source to a region.
    pub fn register(&mut self, region: Region, source: Arc<dyn QuoteSource>) {
        self.sources.entry(region).or_default().push(source);
    }

    /// Builder form of [`SourceRegistry::register`].
    #[must_use]
    pub fn with_source(mut self, region: Region, source: Arc<dyn QuoteSource>) -> Self {
        self.register(region, source);
        self
    }

    /// Returns the sources of a region in registration order.
    ///
    /// Unknown regions yield an empty slice.
    #[must_use]
    pub fn sources_for(&self, region: Region) -> &[Arc<dyn QuoteSource>] {
        self.sources.get(&region).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if at least one source is registered for `region`.
    #[must_use]
    pub fn has_sources(&self, region: Region) -> bool {
        !self.sources_for(region).is_empty()
    }

    /// Returns the regions with at least one source.
    #[must_use]
    pub fn regions(&self) -> Vec<Region> {
        Region::ALL
            .into_iter()
            .filter(|region| self.has_sources(*region))
            .collect()
    }

    /// Total number of registered sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.values().map(Vec::len).sum()
    }

    /// Returns true if no source is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds the registry of public web sources.
    ///
    /// ARS: Ámbito, DolarHoy and El Cronista, each publishing explicit buy
    /// and sell prices. BRL: Wise (mid rate, 2% each side), Nubank (4% fill)
    /// and Nomad (3% fill).
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Internal` if an extraction pattern fails to
    /// compile.
    pub fn reference(client: &HttpClient) -> SourceResult<Self> {
        let web = |name: &str, url: &str, extraction: Extraction| -> Arc<dyn QuoteSource> {
            Arc::new(WebQuoteSource::new(name, url, client.clone(), extraction))
        };

        let registry = Self::new()
            .with_source(
                Region::Ars,
                web(
                    "Ambito",
                    "https://www.ambito.com/contenidos/dolar.html",
                    Extraction::labeled(
                        r#"class="[^"]*data-compra[^"]*"[^>]*>\s*([^<]+)<"#,
                        r#"class="[^"]*data-venta[^"]*"[^>]*>\s*([^<]+)<"#,
                    )?,
                ),
            )
            .with_source(
                Region::Ars,
                web(
                    "DolarHoy",
                    "https://www.dolarhoy.com",
                    Extraction::labeled(
                        r#"(?s)class="compra"[^>]*>.*?class="val"[^>]*>\s*([^<]+)<"#,
                        r#"(?s)class="venta"[^>]*>.*?class="val"[^>]*>\s*([^<]+)<"#,
                    )?,
                ),
            )
            .with_source(
                Region::Ars,
                web(
                    "Cronista",
                    "https://www.cronista.com/MercadosOnline/moneda.html?id=ARSB",
                    Extraction::labeled(
                        r#"class="[^"]*(?:buy-value|compra)[^"]*"[^>]*>\s*([^<]+)<"#,
                        r#"class="[^"]*(?:sell-value|venta)[^"]*"[^>]*>\s*([^<]+)<"#,
                    )?,
                ),
            )
            .with_source(
                Region::Brl,
                web(
                    "Wise",
                    "https://wise.com/es/currency-converter/brl-to-usd-rate",
                    Extraction::mid_rate(r"1\s*BRL\s*=\s*([\d.,]+)\s*USD", 0.02, true)?,
                ),
            )
            .with_source(
                Region::Brl,
                web(
                    "Nubank",
                    "https://nubank.com.br/taxas-conversao/",
                    Extraction::banded(r"R\$\s*([\d.,]+)", BRL_BAND, Some(SpreadFill::new(0.04)))?,
                ),
            )
            .with_source(
                Region::Brl,
                web(
                    "Nomad",
                    "https://www.nomadglobal.com",
                    Extraction::banded(
                        r#"class="[^"]*(?:exchange-rate|rate-display)[^"]*"[^>]*>[^<\d]*([\d.,]+)"#,
                        BRL_BAND,
                        Some(SpreadFill::new(0.03)),
                    )?,
                ),
            );

        Ok(registry)
    }
}
