//! # Background Persistence
//!
//! Fire-and-forget hand-off of accepted quotes to a [`QuoteStore`].
//!
//! The read path calls [`PersistenceQueue::enqueue`], which never waits: a
//! full queue drops the batch with a warning. One worker task drains the
//! queue and appends each quote; store errors are logged and swallowed.
//! The worker exits once every queue handle has been dropped and the
//! remaining batches are written.

use crate::domain::entities::quote::Quote;
use crate::domain::value_objects::Region;
use crate::infrastructure::persistence::traits::QuoteStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

/// Quotes of one aggregation round awaiting persistence.
#[derive(Debug, Clone)]
pub struct PersistBatch {
    /// Region the quotes belong to.
    pub region: Region,
    /// Accepted quotes.
    pub quotes: Vec<Quote>,
}

/// Sending half of the persistence queue.
#[derive(Debug, Clone)]
pub struct PersistenceQueue {
    tx: mpsc::Sender<PersistBatch>,
}

impl PersistenceQueue {
    /// Queues `quotes` for persistence without waiting.
    ///
    /// Returns `false` if the batch was dropped because the queue is full or
    /// the worker is gone.
    pub fn enqueue(&self, region: Region, quotes: &[Quote]) -> bool {
        if quotes.is_empty() {
            return true;
        }

        let batch = PersistBatch {
            region,
            quotes: quotes.to_vec(),
        };

        match self.tx.try_send(batch) {
            Ok(()) => true,
            Err(TrySendError::Full(batch)) => {
                tracing::warn!(
                    %region,
                    dropped = batch.quotes.len(),
                    "persistence queue full, dropping quotes"
                );
                false
            }
            Err(TrySendError::Closed(batch)) => {
                tracing::warn!(
                    %region,
                    dropped = batch.quotes.len(),
                    "persistence worker stopped, dropping quotes"
                );
                false
            }
        }
    }

    /// Returns the number of free slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }
}

/// Spawns the worker draining the queue into `store`.
///
/// A zero capacity is raised to one.
pub fn spawn_persistence_worker(
    store: Arc<dyn QuoteStore>,
    capacity: usize,
) -> (PersistenceQueue, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = tokio::spawn(run_worker(store, rx));
    (PersistenceQueue { tx }, handle)
}

async fn run_worker(store: Arc<dyn QuoteStore>, mut rx: mpsc::Receiver<PersistBatch>) {
    while let Some(batch) = rx.recv().await {
        let mut saved = 0usize;
        for quote in &batch.quotes {
            match store.append(batch.region, quote).await {
                Ok(()) => saved += 1,
                Err(e) => tracing::error!(
                    region = %batch.region,
                    source = %quote.source(),
                    error = %e,
                    "failed to persist quote"
                ),
            }
        }
        tracing::debug!(region = %batch.region, saved, "persisted quotes");
    }
    tracing::debug!("persistence worker stopped");
}
