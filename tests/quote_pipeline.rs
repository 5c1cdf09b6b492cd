//! Pipeline behavior through the public service API, on virtual time.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use async_trait::async_trait;
use parking_lot::Mutex;
use quote_consensus::application::services::{
    Backoff, QuoteAggregationEngine, QuoteService, RetryPolicy, RetryingFetcher,
    spawn_persistence_worker,
};
use quote_consensus::domain::value_objects::{Region, SourceId};
use quote_consensus::infrastructure::persistence::{InMemoryQuoteStore, QuoteStore};
use quote_consensus::infrastructure::sources::{
    QuoteSource, RawQuote, SourceError, SourceRegistry, SourceResult,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::Instant;

const TTL: Duration = Duration::from_secs(60);
const BASE_DELAY: Duration = Duration::from_secs(1);

/// Source whose next answer can be swapped from the test.
#[derive(Debug)]
struct StubSource {
    id: SourceId,
    answer: Mutex<Option<(f64, f64)>>,
    calls: AtomicU32,
}

impl StubSource {
    fn new(id: &str, answer: Option<(f64, f64)>) -> Arc<Self> {
        Arc::new(Self {
            id: SourceId::new(id),
            answer: Mutex::new(answer),
            calls: AtomicU32::new(0),
        })
    }

    fn answer(&self, answer: Option<(f64, f64)>) {
        *self.answer.lock() = answer;
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for StubSource {
    fn source_id(&self) -> &SourceId {
        &self.id
    }

    fn timeout_ms(&self) -> u64 {
        10_000
    }

    async fn fetch(&self) -> SourceResult<RawQuote> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match *self.answer.lock() {
            Some((buy, sell)) => Ok(RawQuote::new(buy, sell)),
            None => Err(SourceError::connection("connection refused")),
        }
    }
}

struct Harness {
    service: QuoteService,
    store: InMemoryQuoteStore,
}

fn harness(sources: &[Arc<StubSource>]) -> Harness {
    let mut registry = SourceRegistry::new();
    for source in sources {
        registry.register(Region::Ars, source.clone());
    }
    let engine = QuoteAggregationEngine::new(
        Arc::new(registry),
        RetryingFetcher::new(RetryPolicy::new(2, Backoff::linear(BASE_DELAY))),
    );
    let store = InMemoryQuoteStore::new();
    let (queue, _worker) = spawn_persistence_worker(Arc::new(store.clone()), 32);
    let service = QuoteService::new(engine, Arc::new(store.clone()), queue, Region::Ars, TTL);
    Harness { service, store }
}

#[tokio::test(start_paused = true)]
async fn reference_example() {
    let a = StubSource::new("a", Some((800.0, 850.0)));
    let b = StubSource::new("b", Some((820.0, 860.0)));
    let c = StubSource::new("c", None);
    let h = harness(&[a, b, c.clone()]);

    let average = h.service.average(Region::Ars, false).await.unwrap();
    assert_eq!(average.source_count, 2);
    assert_eq!(average.average_buy, 810.0);
    assert_eq!(average.average_sell, 855.0);

    let slippage = h.service.slippage(Region::Ars, false).await.unwrap();
    assert_eq!(slippage.len(), 2);
    assert_eq!(slippage[0].buy_slippage(), -0.0123);
    assert_eq!(slippage[1].buy_slippage(), 0.0123);
    assert_eq!(slippage[0].buy_diff(), -10.0);

    // Both reads came from one aggregation; C was tried twice.
    assert_eq!(c.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn single_survivor_defines_the_average() {
    let a = StubSource::new("a", None);
    let b = StubSource::new("b", Some((5.12, 5.34)));
    let h = harness(&[a, b]);

    let snapshot = h.service.snapshot(Region::Ars, false).await.unwrap();

    assert_eq!(snapshot.source_count(), 1);
    assert_eq!(snapshot.average_buy(), 5.12);
    assert_eq!(snapshot.average_sell(), 5.34);
    assert_eq!(snapshot.slippage()[0].sell_slippage(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn total_failure_keeps_cached_result() {
    let a = StubSource::new("a", Some((800.0, 850.0)));
    let h = harness(&[a.clone()]);

    let before = h.service.snapshot(Region::Ars, false).await.unwrap();

    a.answer(None);
    let err = h.service.snapshot(Region::Ars, true).await.unwrap_err();
    assert!(err.is_all_sources_failed());

    let after = h.service.snapshot(Region::Ars, false).await.unwrap();
    assert!(Arc::ptr_eq(&before, &after));
}

#[tokio::test(start_paused = true)]
async fn cache_expires_after_ttl() {
    let a = StubSource::new("a", Some((800.0, 850.0)));
    let h = harness(&[a.clone()]);

    h.service.quotes(Region::Ars, false).await.unwrap();
    a.answer(Some((900.0, 950.0)));

    tokio::time::advance(Duration::from_secs(30)).await;
    let cached = h.service.average(Region::Ars, false).await.unwrap();
    assert_eq!(cached.average_buy, 800.0);

    tokio::time::advance(Duration::from_secs(31)).await;
    let fresh = h.service.average(Region::Ars, false).await.unwrap();
    assert_eq!(fresh.average_buy, 900.0);
    assert_eq!(a.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn forced_refresh_always_fetches() {
    let a = StubSource::new("a", Some((800.0, 850.0)));
    let h = harness(&[a.clone()]);

    for _ in 0..3 {
        h.service.quotes(Region::Ars, true).await.unwrap();
    }

    assert_eq!(a.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn retry_sleeps_one_base_delay() {
    let a = StubSource::new("a", None);
    let h = harness(&[a.clone()]);

    let flip = {
        let a = a.clone();
        tokio::spawn(async move {
            // Flip the source while the fetcher backs off.
            tokio::time::sleep(Duration::from_millis(500)).await;
            a.answer(Some((800.0, 850.0)));
        })
    };

    let start = Instant::now();
    let snapshot = h.service.snapshot(Region::Ars, false).await.unwrap();
    flip.await.unwrap();

    assert_eq!(snapshot.average_buy(), 800.0);
    assert_eq!(a.calls(), 2);
    assert_eq!(start.elapsed(), BASE_DELAY);
}

#[tokio::test]
async fn accepted_quotes_reach_history() {
    let a = StubSource::new("a", Some((800.0, 850.0)));
    let b = StubSource::new("b", Some((820.0, 860.0)));
    let h = harness(&[a, b]);

    h.service.snapshot(Region::Ars, false).await.unwrap();

    let mut stored = 0;
    for _ in 0..50 {
        stored = h.store.count().await.unwrap();
        if stored == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(stored, 2);

    let history = h.service.historical(Some(10)).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|q| q.region == Region::Ars));
}
