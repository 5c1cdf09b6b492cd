//! # Quote Aggregation Engine
//!
//! Orchestrates concurrent quote collection and consensus.
//!
//! [`QuoteAggregationEngine::aggregate`] spawns one task per source of the
//! requested region, each running the [`RetryingFetcher`], then waits for
//! every task to settle. Successful quotes become an [`AggregateResult`]
//! (averages plus failure diagnostics); if nothing succeeded the round fails
//! with [`AggregationError::AllSourcesFailed`].

use crate::application::services::retry::RetryingFetcher;
use crate::domain::entities::aggregate::{AggregateResult, SourceFailure};
use crate::domain::value_objects::Region;
use crate::infrastructure::sources::registry::SourceRegistry;
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;

/// Error type for aggregation operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    /// The region has no registered sources.
    #[error("no quote sources registered for region {0}")]
    NoSourcesForRegion(Region),

    /// Every source of the region failed.
    #[error("all quote sources failed for region {region}: {}", summarize(.failures))]
    AllSourcesFailed {
        /// Region being aggregated.
        region: Region,
        /// One entry per source.
        failures: Vec<SourceFailure>,
    },
}

impl AggregationError {
    /// Returns true if every source failed.
    #[must_use]
    pub fn is_all_sources_failed(&self) -> bool {
        matches!(self, Self::AllSourcesFailed { .. })
    }

    /// Returns the per-source failures, if any.
    #[must_use]
    pub fn failures(&self) -> &[SourceFailure] {
        match self {
            Self::AllSourcesFailed { failures, .. } => failures,
            Self::NoSourcesForRegion(_) => &[],
        }
    }
}

fn summarize(failures: &[SourceFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for aggregation operations.
pub type AggregationResult<T> = Result<T, AggregationError>;

/// Engine collecting quotes from every source of a region.
#[derive(Debug, Clone)]
pub struct QuoteAggregationEngine {
    registry: Arc<SourceRegistry>,
    fetcher: RetryingFetcher,
}

impl QuoteAggregationEngine {
    /// Creates a new engine.
    #[must_use]
    pub fn new(registry: Arc<SourceRegistry>, fetcher: RetryingFetcher) -> Self {
        Self { registry, fetcher }
    }

    /// Returns the source registry.
    #[must_use]
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Collects quotes for `region` and computes the consensus.
    ///
    /// Quotes keep the registry order regardless of which source answered
    /// first.
    ///
    /// # Errors
    ///
    /// - [`AggregationError::NoSourcesForRegion`] if the region has no sources
    /// - [`AggregationError::AllSourcesFailed`] if no source produced a quote
    pub async fn aggregate(&self, region: Region) -> AggregationResult<AggregateResult> {
        let sources = self.registry.sources_for(region);
        if sources.is_empty() {
            return Err(AggregationError::NoSourcesForRegion(region));
        }

        let handles: Vec<_> = sources
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                let fetcher = self.fetcher;
                tokio::spawn(async move { fetcher.fetch(source.as_ref()).await })
            })
            .collect();

        let outcomes = join_all(handles).await;

        let mut quotes = Vec::with_capacity(sources.len());
        let mut failures = Vec::new();

        for (source, outcome) in sources.iter().zip(outcomes) {
            match outcome {
                Ok(Ok(quote)) => quotes.push(quote),
                Ok(Err(failure)) => failures.push(failure),
                Err(e) => failures.push(SourceFailure::new(
                    source.source_id().clone(),
                    format!("task panicked: {}", e),
                    1,
                )),
            }
        }

        for failure in &failures {
            tracing::warn!(
                %region,
                source = %failure.source,
                attempts = failure.attempts,
                error = %failure.message,
                "quote source failed"
            );
        }

        if quotes.is_empty() {
            tracing::error!(%region, failed = failures.len(), "all quote sources failed");
            return Err(AggregationError::AllSourcesFailed { region, failures });
        }

        let result = AggregateResult::compute(region, quotes, failures);
        tracing::info!(
            %region,
            sources = result.source_count(),
            failed = result.failures().len(),
            average_buy = result.average_buy(),
            average_sell = result.average_sell(),
            "aggregated quotes"
        );

        Ok(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::application::services::retry::{Backoff, RetryPolicy};
    use crate::domain::value_objects::SourceId;
    use crate::infrastructure::sources::error::{SourceError, SourceResult};
    use crate::infrastructure::sources::traits::{QuoteSource, RawQuote};
    use async_trait::async_trait;
    use std::time::Duration;

    #[derive(Debug)]
    enum Behavior {
        Quote(f64, f64),
        Fail,
        Panic,
    }

    #[derive(Debug)]
    struct MockQuoteSource {
        id: SourceId,
        behavior: Behavior,
        delay_ms: u64,
    }

    impl MockQuoteSource {
        fn successful(id: &str, buy: f64, sell: f64) -> Arc<dyn QuoteSource> {
            Arc::new(Self {
                id: SourceId::new(id),
                behavior: Behavior::Quote(buy, sell),
                delay_ms: 0,
            })
        }

        fn slow(id: &str, buy: f64, sell: f64, delay_ms: u64) -> Arc<dyn QuoteSource> {
            Arc::new(Self {
                id: SourceId::new(id),
                behavior: Behavior::Quote(buy, sell),
                delay_ms,
            })
        }

        fn failing(id: &str) -> Arc<dyn QuoteSource> {
            Arc::new(Self {
                id: SourceId::new(id),
                behavior: Behavior::Fail,
                delay_ms: 0,
            })
        }

        fn panicking(id: &str) -> Arc<dyn QuoteSource> {
            Arc::new(Self {
                id: SourceId::new(id),
                behavior: Behavior::Panic,
                delay_ms: 0,
            })
        }
    }

    #[async_trait]
    impl QuoteSource for MockQuoteSource {
        fn source_id(&self) -> &SourceId {
            &self.id
        }

        fn timeout_ms(&self) -> u64 {
            5_000
        }

        async fn fetch(&self) -> SourceResult<RawQuote> {
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            match self.behavior {
                Behavior::Quote(buy, sell) => Ok(RawQuote::new(buy, sell)),
                Behavior::Fail => Err(SourceError::quote_not_found("no prices on page")),
                Behavior::Panic => panic!("scraper bug"),
            }
        }
    }

    fn engine(sources: Vec<(Region, Arc<dyn QuoteSource>)>) -> QuoteAggregationEngine {
        let mut registry = SourceRegistry::new();
        for (region, source) in sources {
            registry.register(region, source);
        }
        QuoteAggregationEngine::new(
            Arc::new(registry),
            RetryingFetcher::new(RetryPolicy::new(2, Backoff::linear(Duration::from_secs(1)))),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn partial_failure_averages_survivors() {
        let engine = engine(vec![
            (Region::Ars, MockQuoteSource::successful("a", 800.0, 850.0)),
            (Region::Ars, MockQuoteSource::successful("b", 820.0, 860.0)),
            (Region::Ars, MockQuoteSource::failing("c")),
        ]);

        let result = engine.aggregate(Region::Ars).await.unwrap();

        assert_eq!(result.source_count(), 2);
        assert_eq!(result.average_buy(), 810.0);
        assert_eq!(result.average_sell(), 855.0);

        let slippage = result.slippage();
        assert_eq!(slippage[0].buy_slippage(), -0.0123);
        assert_eq!(slippage[1].buy_slippage(), 0.0123);

        assert_eq!(result.failures().len(), 1);
        assert_eq!(result.failures()[0].source.as_str(), "c");
        assert_eq!(result.failures()[0].attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn all_failed_is_error() {
        let engine = engine(vec![
            (Region::Brl, MockQuoteSource::failing("x")),
            (Region::Brl, MockQuoteSource::failing("y")),
        ]);

        let err = engine.aggregate(Region::Brl).await.unwrap_err();

        assert!(err.is_all_sources_failed());
        assert_eq!(err.failures().len(), 2);
        assert!(err.to_string().contains("BRL"));
        assert!(err.to_string().contains("no prices on page"));
    }

    #[tokio::test]
    async fn region_without_sources() {
        let engine = engine(vec![(Region::Ars, MockQuoteSource::successful("a", 1.0, 2.0))]);

        let err = engine.aggregate(Region::Brl).await.unwrap_err();

        assert_eq!(err, AggregationError::NoSourcesForRegion(Region::Brl));
        assert!(err.failures().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn order_follows_registry_not_completion() {
        let engine = engine(vec![
            (Region::Ars, MockQuoteSource::slow("slow", 800.0, 850.0, 500)),
            (Region::Ars, MockQuoteSource::successful("fast", 820.0, 860.0)),
        ]);

        let result = engine.aggregate(Region::Ars).await.unwrap();

        let order: Vec<&str> = result.quotes().iter().map(|q| q.source().as_str()).collect();
        assert_eq!(order, vec!["slow", "fast"]);
    }

    #[tokio::test]
    async fn panicking_source_is_reported_as_failure() {
        let engine = engine(vec![
            (Region::Ars, MockQuoteSource::panicking("boom")),
            (Region::Ars, MockQuoteSource::successful("ok", 800.0, 850.0)),
        ]);

        let result = engine.aggregate(Region::Ars).await.unwrap();

        assert_eq!(result.source_count(), 1);
        assert_eq!(result.average_buy(), 800.0);
        assert_eq!(result.average_sell(), 850.0);
        assert_eq!(result.failures()[0].source.as_str(), "boom");
        assert!(result.failures()[0].message.contains("panicked"));
    }

    #[tokio::test(start_paused = true)]
    async fn sources_run_concurrently() {
        let engine = engine(vec![
            (Region::Ars, MockQuoteSource::slow("a", 800.0, 850.0, 1_000)),
            (Region::Ars, MockQuoteSource::slow("b", 820.0, 860.0, 1_000)),
            (Region::Ars, MockQuoteSource::slow("c", 810.0, 855.0, 1_000)),
        ]);
        let start = tokio::time::Instant::now();

        engine.aggregate(Region::Ars).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }
}
