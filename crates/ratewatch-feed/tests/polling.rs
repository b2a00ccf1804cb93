//! End-to-end polling and aggregation tests against a mock HTTP server.
//!
//! Exercises the full pipeline: feed polling with cache busting, value
//! extraction, debounced aggregation and output emission.

use ratewatch_core::Quantity;
use ratewatch_feed::{Aggregator, DataFeed, ExtractorSpec, FeedError, MemorySink, ValueProvider};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const DEBOUNCE: Duration = Duration::from_millis(20);

async fn ticker_server(body: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ticker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    server
}

fn pointer(path: &str) -> Arc<ExtractorSpec> {
    Arc::new(ExtractorSpec::Pointer {
        path: path.to_string(),
    })
}

/// Wait until the sink holds at least `count` lines.
async fn wait_for_lines(sink: &MemorySink, count: usize) -> Vec<String> {
    timeout(Duration::from_secs(2), async {
        loop {
            let lines = sink.lines();
            if lines.len() >= count {
                return lines;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("sink should receive output within timeout")
}

#[tokio::test]
async fn test_polling_pipeline_emits_aggregate_line() {
    let server = ticker_server(json!({"btc_usd": {"last": 2500.5}})).await;
    let feed = Arc::new(
        DataFeed::new(format!("{}/ticker", server.uri()), POLL_INTERVAL).unwrap(),
    );
    let provider =
        ValueProvider::new(Quantity::BtcUsd, feed.clone(), pointer("/btc_usd/last")).unwrap();
    let sink = Arc::new(MemorySink::new());
    let aggregator = Aggregator::with_debounce(vec![provider], sink.clone(), DEBOUNCE).unwrap();

    aggregator.start().unwrap();
    let lines = wait_for_lines(&sink, 1).await;
    aggregator.stop().unwrap();

    assert!(lines[0].contains("BTC/USD: 2500.5"), "line: {}", lines[0]);
    assert!(lines[0].contains("BTC/USD (1 of 1)"), "line: {}", lines[0]);
}

#[tokio::test]
async fn test_shared_feed_yields_all_quantities_in_one_line() {
    let server = ticker_server(json!({
        "btc_usd": {"last": 2500.0},
        "btc_eur": {"last": 2200.0},
        "eur_usd": {"last": 1.13},
    }))
    .await;
    let feed = Arc::new(
        DataFeed::new(format!("{}/ticker", server.uri()), POLL_INTERVAL).unwrap(),
    );
    let providers = vec![
        ValueProvider::new(Quantity::BtcUsd, feed.clone(), pointer("/btc_usd/last")).unwrap(),
        ValueProvider::new(Quantity::BtcEur, feed.clone(), pointer("/btc_eur/last")).unwrap(),
        ValueProvider::new(Quantity::EurUsd, feed.clone(), pointer("/eur_usd/last")).unwrap(),
    ];
    let sink = Arc::new(MemorySink::new());
    let aggregator = Aggregator::with_debounce(providers, sink.clone(), DEBOUNCE).unwrap();

    aggregator.start().unwrap();
    let lines = wait_for_lines(&sink, 1).await;
    aggregator.stop().unwrap();

    let line = &lines[0];
    assert!(line.contains("BTC/USD: 2500"), "line: {line}");
    assert!(line.contains("BTC/EUR: 2200"), "line: {line}");
    assert!(line.contains("EUR/USD: 1.13"), "line: {line}");
    assert!(line.contains("BTC/USD (1 of 1)"), "line: {line}");
}

#[tokio::test]
async fn test_error_responses_produce_no_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ticker"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let feed = Arc::new(
        DataFeed::new(format!("{}/ticker", server.uri()), POLL_INTERVAL).unwrap(),
    );
    let provider =
        ValueProvider::new(Quantity::BtcUsd, feed.clone(), pointer("/last")).unwrap();
    let sink = Arc::new(MemorySink::new());
    let aggregator =
        Aggregator::with_debounce(vec![provider.clone()], sink.clone(), DEBOUNCE).unwrap();

    aggregator.start().unwrap();
    tokio::time::sleep(POLL_INTERVAL * 4).await;
    aggregator.stop().unwrap();

    // Errors before any success: no value, not outdated, no emission.
    assert!(sink.is_empty());
    assert!(provider.value().is_none());
    assert!(!provider.is_out_dated());
    assert!(
        server.received_requests().await.unwrap().len() >= 2,
        "polling must continue across failures"
    );
}

#[tokio::test]
async fn test_stop_halts_polling() {
    let server = ticker_server(json!({"last": 1.0})).await;
    let feed = Arc::new(
        DataFeed::new(format!("{}/ticker", server.uri()), POLL_INTERVAL).unwrap(),
    );

    feed.start().unwrap();
    tokio::time::sleep(POLL_INTERVAL * 3).await;
    feed.stop().unwrap();

    // Give any in-flight request time to complete, then observe quiescence.
    tokio::time::sleep(POLL_INTERVAL).await;
    let after_stop = server.received_requests().await.unwrap().len();
    tokio::time::sleep(POLL_INTERVAL * 4).await;
    let later = server.received_requests().await.unwrap().len();

    assert_eq!(after_stop, later, "no polls may be issued after stop()");
    assert!(matches!(feed.stop().unwrap_err(), FeedError::NotRunning(_)));
}

#[tokio::test]
async fn test_cache_buster_varies_between_requests() {
    let server = ticker_server(json!({"last": 1.0})).await;
    let feed = Arc::new(
        DataFeed::new(format!("{}/ticker", server.uri()), POLL_INTERVAL).unwrap(),
    );

    feed.start().unwrap();
    timeout(Duration::from_secs(2), async {
        loop {
            if server.received_requests().await.unwrap().len() >= 2 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("at least two polls expected");
    feed.stop().unwrap();

    let requests = server.received_requests().await.unwrap();
    let queries: Vec<String> = requests
        .iter()
        .take(2)
        .map(|r| r.url.query().unwrap_or_default().to_string())
        .collect();

    assert!(queries[0].starts_with("nocache="));
    assert!(queries[1].starts_with("nocache="));
    assert_ne!(queries[0], queries[1], "cache buster must vary per request");
}

#[tokio::test]
async fn test_value_change_triggers_new_emission() {
    let server = MockServer::start().await;
    // First poll sees 100, later polls see 150.
    Mock::given(method("GET"))
        .and(path("/ticker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"last": 100.0})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ticker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"last": 150.0})))
        .mount(&server)
        .await;

    let feed = Arc::new(
        DataFeed::new(format!("{}/ticker", server.uri()), POLL_INTERVAL).unwrap(),
    );
    let provider = ValueProvider::new(Quantity::BtcUsd, feed.clone(), pointer("/last")).unwrap();
    let sink = Arc::new(MemorySink::new());
    let aggregator = Aggregator::with_debounce(vec![provider], sink.clone(), DEBOUNCE).unwrap();

    aggregator.start().unwrap();
    let lines = wait_for_lines(&sink, 2).await;
    aggregator.stop().unwrap();

    assert!(lines[0].contains("BTC/USD: 100"), "line: {}", lines[0]);
    assert!(lines[1].contains("BTC/USD: 150"), "line: {}", lines[1]);
}
