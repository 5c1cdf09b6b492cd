//! # In-Memory Quote Store
//!
//! In-memory implementation of [`QuoteStore`] for tests and storage-less
//! deployments.

use crate::domain::entities::quote::Quote;
use crate::domain::value_objects::Region;
use crate::infrastructure::persistence::traits::{QuoteStore, RepositoryResult, StoredQuote};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`QuoteStore`].
///
/// Rows are kept in insertion order behind a tokio `RwLock`. Clones share
/// the same storage.
#[derive(Debug, Clone)]
pub struct InMemoryQuoteStore {
    storage: Arc<RwLock<Vec<StoredQuote>>>,
}

impl InMemoryQuoteStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Returns the number of stored rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage
            .try_read()
            .map(|guard| guard.len())
            .unwrap_or(0)
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every row.
    pub async fn clear(&self) {
        let mut storage = self.storage.write().await;
        storage.clear();
    }
}

impl Default for InMemoryQuoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteStore for InMemoryQuoteStore {
    async fn append(&self, region: Region, quote: &Quote) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        let id = i64::try_from(storage.len()).unwrap_or(i64::MAX).saturating_add(1);
        storage.push(StoredQuote {
            id,
            region,
            source: quote.source().clone(),
            buy_price: quote.buy_price(),
            sell_price: quote.sell_price(),
            observed_at: quote.observed_at(),
        });
        Ok(())
    }

    async fn history(&self, region: Region, limit: u32) -> RepositoryResult<Vec<StoredQuote>> {
        let storage = self.storage.read().await;
        let mut rows: Vec<StoredQuote> = storage
            .iter()
            .filter(|row| row.region == region)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.observed_at.cmp(&a.observed_at).then(b.id.cmp(&a.id)));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn count(&self) -> RepositoryResult<u64> {
        let storage = self.storage.read().await;
        Ok(storage.len() as u64)
    }
}
