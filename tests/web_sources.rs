//! End-to-end aggregation over HTTP sources served by a mock server.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use quote_consensus::application::services::{
    Backoff, QuoteAggregationEngine, RetryPolicy, RetryingFetcher,
};
use quote_consensus::domain::value_objects::Region;
use quote_consensus::infrastructure::sources::{
    Extraction, HttpClient, PriceBand, QuoteSource, SourceRegistry, SpreadFill, WebQuoteSource,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUY: &str = r#"id="compra">([^<]+)<"#;
const SELL: &str = r#"id="venta">([^<]+)<"#;

fn page(buy: &str, sell: &str) -> String {
    format!(
        r#"<html><body><div id="compra">{buy}</div><div id="venta">{sell}</div></body></html>"#
    )
}

fn client() -> HttpClient {
    HttpClient::new(2_000, "quote-consensus-tests").unwrap()
}

fn fetcher() -> RetryingFetcher {
    RetryingFetcher::new(RetryPolicy::new(
        2,
        Backoff::fixed(Duration::from_millis(10)),
    ))
}

fn labeled(name: &str, url: String) -> Arc<dyn QuoteSource> {
    Arc::new(WebQuoteSource::new(
        name,
        url,
        client(),
        Extraction::labeled(BUY, SELL).unwrap(),
    ))
}

async fn serve(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn labeled_sources_with_one_transient_failure() {
    let server = MockServer::start().await;

    serve(&server, "/a", 200, page("$ 1.180,00", "$ 1.220,00")).await;

    // First hit fails, the retry succeeds.
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    serve(&server, "/b", 200, page("1200", "1240")).await;

    serve(&server, "/c", 200, "<html>redesigned</html>".to_string()).await;

    let registry = SourceRegistry::new()
        .with_source(Region::Ars, labeled("A", format!("{}/a", server.uri())))
        .with_source(Region::Ars, labeled("B", format!("{}/b", server.uri())))
        .with_source(Region::Ars, labeled("C", format!("{}/c", server.uri())));
    let engine = QuoteAggregationEngine::new(Arc::new(registry), fetcher());

    let result = engine.aggregate(Region::Ars).await.unwrap();

    assert_eq!(result.source_count(), 2);
    assert_eq!(result.average_buy(), 1190.0);
    assert_eq!(result.average_sell(), 1230.0);
    assert!(result.quotes()[0].source().as_str().ends_with("/a"));
    assert!(result.quotes()[1].source().as_str().ends_with("/b"));

    let failures = result.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].source.as_str().ends_with("/c"));
    assert_eq!(failures[0].attempts, 2);
    assert!(failures[0].message.contains("not found"));
}

#[tokio::test]
async fn derived_brl_quotes() {
    let server = MockServer::start().await;

    serve(
        &server,
        "/wise",
        200,
        "<p>1 BRL = 0,1850 USD</p>".to_string(),
    )
    .await;
    serve(
        &server,
        "/nubank",
        200,
        "<span>R$ 100,00</span><span>R$ 5,10</span>".to_string(),
    )
    .await;

    let wise: Arc<dyn QuoteSource> = Arc::new(WebQuoteSource::new(
        "Wise",
        format!("{}/wise", server.uri()),
        client(),
        Extraction::mid_rate(r"1\s*BRL\s*=\s*([\d.,]+)\s*USD", 0.02, true).unwrap(),
    ));
    let nubank: Arc<dyn QuoteSource> = Arc::new(WebQuoteSource::new(
        "Nubank",
        format!("{}/nubank", server.uri()),
        client(),
        Extraction::banded(
            r"R\$\s*([\d.,]+)",
            PriceBand::new(1.0, 10.0),
            Some(SpreadFill::new(0.04)),
        )
        .unwrap(),
    ));

    let registry = SourceRegistry::new()
        .with_source(Region::Brl, wise)
        .with_source(Region::Brl, nubank);
    let engine = QuoteAggregationEngine::new(Arc::new(registry), fetcher());

    let result = engine.aggregate(Region::Brl).await.unwrap();
    let quotes = result.quotes();

    // 1 / 0.185 widened by 2% on each side.
    assert_eq!(quotes[0].buy_price(), 5.2973);
    assert_eq!(quotes[0].sell_price(), 5.5135);
    // Only 5.10 is inside the band; sell is filled at +4%.
    assert_eq!(quotes[1].buy_price(), 5.1);
    assert_eq!(quotes[1].sell_price(), 5.304);
    assert!(result.failures().is_empty());
}

#[tokio::test]
async fn every_source_down_is_all_sources_failed() {
    let server = MockServer::start().await;
    serve(&server, "/a", 500, "boom".to_string()).await;
    serve(&server, "/b", 404, "gone".to_string()).await;

    let registry = SourceRegistry::new()
        .with_source(Region::Ars, labeled("A", format!("{}/a", server.uri())))
        .with_source(Region::Ars, labeled("B", format!("{}/b", server.uri())));
    let engine = QuoteAggregationEngine::new(Arc::new(registry), fetcher());

    let err = engine.aggregate(Region::Ars).await.unwrap_err();

    assert!(err.is_all_sources_failed());
    let failures = err.failures();
    assert_eq!(failures.len(), 2);
    assert!(failures[0].message.contains("500"));
    assert!(failures[1].message.contains("404"));
}
