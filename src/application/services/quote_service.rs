//! # Quote Service
//!
//! Query facade over the aggregation pipeline.
//!
//! Every read goes through [`QuoteService::snapshot`]: a cache hit returns the
//! shared [`AggregateResult`]; a miss (or a forced refresh) runs the engine,
//! replaces the cache entry and queues the accepted quotes for persistence.
//! Quotes, averages and slippage are all views of that one snapshot.
//!
//! The service also owns the active [`Region`], read by
//! [`QuoteService::historical`] and by callers that do not pick a region.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::persistence::PersistenceQueue;
use crate::application::services::quote_aggregation::QuoteAggregationEngine;
use crate::application::services::quote_cache::QuoteCache;
use crate::domain::entities::aggregate::{AggregateResult, AverageSummary, SlippageRecord};
use crate::domain::entities::quote::Quote;
use crate::domain::value_objects::Region;
use crate::infrastructure::persistence::traits::{QuoteStore, StoredQuote};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

/// Number of history rows returned when no limit is given.
pub const DEFAULT_HISTORY_LIMIT: u32 = 100;

/// Facade serving quotes, averages, slippage and history.
#[derive(Debug)]
pub struct QuoteService {
    engine: QuoteAggregationEngine,
    cache: QuoteCache,
    ttl: Duration,
    store: Arc<dyn QuoteStore>,
    persistence: PersistenceQueue,
    region: RwLock<Region>,
}

impl QuoteService {
    /// Creates a service starting on `region`.
    #[must_use]
    pub fn new(
        engine: QuoteAggregationEngine,
        store: Arc<dyn QuoteStore>,
        persistence: PersistenceQueue,
        region: Region,
        ttl: Duration,
    ) -> Self {
        Self {
            engine,
            cache: QuoteCache::new(),
            ttl,
            store,
            persistence,
            region: RwLock::new(region),
        }
    }

    /// Returns the currently active region.
    #[must_use]
    pub fn active_region(&self) -> Region {
        *self.region.read()
    }

    /// Returns the cache time-to-live.
    #[inline]
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cache.
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &QuoteCache {
        &self.cache
    }

    /// Switches the active region.
    ///
    /// The value is parsed case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::InvalidRegion`] if the value is not a
    /// region or no source is registered for it. The active region is left
    /// unchanged.
    pub fn change_region(&self, value: &str) -> ApplicationResult<Region> {
        let region: Region = value
            .parse()
            .map_err(|_| ApplicationError::invalid_region(value.trim()))?;

        if !self.engine.registry().has_sources(region) {
            return Err(ApplicationError::invalid_region(region.as_str()));
        }

        let previous = std::mem::replace(&mut *self.region.write(), region);
        if previous != region {
            tracing::info!(from = %previous, to = %region, "active region changed");
        }
        Ok(region)
    }

    /// Returns the aggregation for `region`, from cache when fresh.
    ///
    /// With `force_refresh` the cache is skipped and overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Aggregation`] if the region has no sources
    /// or every source failed; an existing cache entry is kept in that case.
    pub async fn snapshot(
        &self,
        region: Region,
        force_refresh: bool,
    ) -> ApplicationResult<Arc<AggregateResult>> {
        if force_refresh {
            tracing::debug!(%region, "forced refresh, bypassing quote cache");
        } else if let Some(cached) = self.cache.get(region) {
            tracing::debug!(%region, "quote cache hit");
            return Ok(cached);
        } else {
            tracing::debug!(%region, "quote cache miss");
        }

        let result = Arc::new(self.engine.aggregate(region).await?);
        self.cache.put(region, Arc::clone(&result), self.ttl);
        self.persistence.enqueue(region, result.quotes());

        Ok(result)
    }

    /// Returns the quotes of `region` in source order.
    ///
    /// # Errors
    ///
    /// See [`QuoteService::snapshot`].
    pub async fn quotes(&self, region: Region, force_refresh: bool) -> ApplicationResult<Vec<Quote>> {
        let snapshot = self.snapshot(region, force_refresh).await?;
        Ok(snapshot.quotes().to_vec())
    }

    /// Returns the averages of `region`.
    ///
    /// # Errors
    ///
    /// See [`QuoteService::snapshot`].
    pub async fn average(
        &self,
        region: Region,
        force_refresh: bool,
    ) -> ApplicationResult<AverageSummary> {
        let snapshot = self.snapshot(region, force_refresh).await?;
        Ok(snapshot.average_summary())
    }

    /// Returns the per-source slippage of `region`.
    ///
    /// # Errors
    ///
    /// See [`QuoteService::snapshot`].
    pub async fn slippage(
        &self,
        region: Region,
        force_refresh: bool,
    ) -> ApplicationResult<Vec<SlippageRecord>> {
        let snapshot = self.snapshot(region, force_refresh).await?;
        Ok(snapshot.slippage())
    }

    /// Returns persisted quotes of the active region, newest first.
    ///
    /// A missing or zero limit means [`DEFAULT_HISTORY_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Repository`] if the store read fails.
    pub async fn historical(&self, limit: Option<u32>) -> ApplicationResult<Vec<StoredQuote>> {
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_HISTORY_LIMIT);
        let region = self.active_region();
        Ok(self.store.history(region, limit).await?)
    }
}
