//! Snapshot Fetch Integration Tests
//!
//! REST snapshot requests against a mock exchange.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::time::Duration;

use rust_decimal_macros::dec;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ticker_stream::{MarketDataClient, MarketDataClientConfig, MarketDataError};

use common::rest_row;

fn client_for(server: &MockServer) -> MarketDataClient {
    MarketDataClient::new(MarketDataClientConfig {
        rest_base_url: format!("{}/api/v3", server.uri()),
        http_timeout: Duration::from_secs(5),
        ..MarketDataClientConfig::default()
    })
    .unwrap()
}

async fn serve(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/24hr"))
        .respond_with(response)
        .mount(server)
        .await;
}

fn market() -> serde_json::Value {
    serde_json::json!([
        rest_row("ETHUSDT", "3000", "2000000000"),
        rest_row("ADAABC", "0.45", "9000000000"),
        rest_row("SOLUSDT", "150", "800000000"),
        rest_row("BTCUSDT", "50000", "5000000000"),
    ])
}

#[tokio::test]
async fn snapshot_keeps_quote_pairs_ranked_by_volume() {
    let server = MockServer::start().await;
    serve(&server, ResponseTemplate::new(200).set_body_json(market())).await;

    let snapshot = assert_ok!(client_for(&server).fetch_snapshot(2).await);

    let summary: Vec<_> = snapshot
        .iter()
        .map(|t| (t.symbol.as_str(), t.name.as_str(), t.rank))
        .collect();
    assert_eq!(summary, [("BTCUSDT", "BTC", 1), ("ETHUSDT", "ETH", 2)]);
    assert_eq!(snapshot[0].fields.last_price, dec!(50000));
    assert_eq!(snapshot[0].fields.quote_volume, dec!(5000000000));
}

#[tokio::test]
async fn snapshot_shorter_than_count_returns_what_exists() {
    let server = MockServer::start().await;
    serve(&server, ResponseTemplate::new(200).set_body_json(market())).await;

    let snapshot = client_for(&server).fetch_snapshot(50).await.unwrap();

    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot[2].symbol, "SOLUSDT");
    assert_eq!(snapshot[2].rank, 3);
}

#[tokio::test]
async fn quote_pairs_list_every_match() {
    let server = MockServer::start().await;
    serve(&server, ResponseTemplate::new(200).set_body_json(market())).await;

    let pairs = client_for(&server).fetch_quote_pairs().await.unwrap();

    let names: Vec<_> = pairs.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["BTC", "ETH", "SOL"]);
}

#[tokio::test]
async fn server_error_is_a_network_error() {
    let server = MockServer::start().await;
    serve(
        &server,
        ResponseTemplate::new(503).set_body_string("maintenance"),
    )
    .await;

    let err = assert_err!(client_for(&server).fetch_snapshot(10).await);

    let MarketDataError::Network(message) = err else {
        panic!("expected a network error, got {err:?}");
    };
    assert!(message.contains("503"), "{message}");
}

#[tokio::test]
async fn malformed_body_is_a_format_error() {
    let server = MockServer::start().await;
    serve(
        &server,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"code": -1121})),
    )
    .await;

    let err = client_for(&server).fetch_snapshot(10).await.unwrap_err();

    assert_eq!(err.kind(), "data_format");
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = MarketDataClient::new(MarketDataClientConfig {
        rest_base_url: format!("http://127.0.0.1:{port}/api/v3"),
        ..MarketDataClientConfig::default()
    })
    .unwrap();

    let err = client.fetch_snapshot(10).await.unwrap_err();

    assert!(matches!(err, MarketDataError::Network(_)));
}
