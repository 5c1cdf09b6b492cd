//! # Quote Cache
//!
//! Time-boxed memoization of the last successful aggregation per region.
//!
//! Entries are immutable [`CacheEntry`] values behind an `Arc`, swapped
//! wholesale in a `DashMap`, so a reader sees either the previous entry or
//! the new one. Expiry is checked on read; expired entries stay until the
//! next `put` replaces them. A TTL too large to add to the current instant
//! makes the entry permanent.
//!
//! Time comes from `tokio::time::Instant`, which follows paused virtual
//! time in tests.

use crate::domain::entities::aggregate::AggregateResult;
use crate::domain::value_objects::Region;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// One cached aggregation.
#[derive(Debug)]
pub struct CacheEntry {
    result: Arc<AggregateResult>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    /// Returns the cached result.
    #[must_use]
    pub fn result(&self) -> &Arc<AggregateResult> {
        &self.result
    }

    /// Returns when the entry stops being served, `None` if never.
    #[must_use]
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Returns true once `now >= expires_at`.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }
}

/// Per-region cache of aggregation results.
#[derive(Debug, Default)]
pub struct QuoteCache {
    entries: DashMap<Region, Arc<CacheEntry>>,
}

impl QuoteCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result for `region` unless missing or expired.
    #[must_use]
    pub fn get(&self, region: Region) -> Option<Arc<AggregateResult>> {
        let entry = self.entries.get(&region).map(|e| Arc::clone(e.value()))?;
        if entry.is_expired() {
            tracing::debug!(%region, "quote cache entry expired");
            return None;
        }
        Some(Arc::clone(&entry.result))
    }

    /// Stores `result` for `region`, replacing any previous entry.
    pub fn put(&self, region: Region, result: Arc<AggregateResult>, ttl: Duration) {
        let entry = CacheEntry {
            result,
            expires_at: Instant::now().checked_add(ttl),
        };
        self.entries.insert(region, Arc::new(entry));
    }

    /// Drops the entry for `region`.
    pub fn invalidate(&self, region: Region) {
        self.entries.remove(&region);
    }

    /// Number of entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
