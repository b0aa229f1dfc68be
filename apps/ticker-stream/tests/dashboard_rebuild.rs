//! Dashboard Rebuild Integration Tests
//!
//! Runs the dashboard against the real stream client over a scripted
//! transport, checking what survives a rebuild.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use tokio::sync::oneshot;

use ticker_stream::{
    ConnectionState, Dashboard, LogSink, MarketDataError, PairSummary, RebuildOutcome,
    SnapshotProvider, StreamFrame, TickerFields, TickerSnapshot,
};

use common::{FakeTransport, client, settle, tick_json, timing};

// =============================================================================
// Scripted Snapshots
// =============================================================================

type Response = Result<Vec<TickerSnapshot>, MarketDataError>;

#[derive(Default)]
struct ScriptedSnapshots {
    queue: Mutex<VecDeque<(Option<oneshot::Receiver<()>>, Response)>>,
}

impl ScriptedSnapshots {
    fn push(&self, rows: Vec<TickerSnapshot>) {
        self.queue.lock().push_back((None, Ok(rows)));
    }

    /// Queue a response that resolves once the returned sender fires.
    fn push_held(&self, rows: Vec<TickerSnapshot>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.queue.lock().push_back((Some(rx), Ok(rows)));
        tx
    }
}

#[async_trait]
impl SnapshotProvider for ScriptedSnapshots {
    async fn fetch_snapshot(&self, _count: usize) -> Result<Vec<TickerSnapshot>, MarketDataError> {
        let next = self.queue.lock().pop_front();
        let Some((hold, response)) = next else {
            return Err(MarketDataError::Network("nothing scripted".to_string()));
        };
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        response
    }

    async fn fetch_quote_pairs(&self) -> Result<Vec<PairSummary>, MarketDataError> {
        Ok(Vec::new())
    }
}

fn rows(symbols: &[&str]) -> Vec<TickerSnapshot> {
    symbols
        .iter()
        .zip(1..)
        .map(|(symbol, rank)| {
            TickerSnapshot::new(
                *symbol,
                symbol.trim_end_matches("USDT"),
                rank,
                TickerFields {
                    last_price: dec!(10),
                    ..TickerFields::default()
                },
            )
        })
        .collect()
}

struct Harness {
    snapshots: Arc<ScriptedSnapshots>,
    transport: Arc<FakeTransport>,
    sink: Arc<LogSink>,
    dashboard: Arc<Dashboard>,
}

fn harness() -> Harness {
    let snapshots = Arc::new(ScriptedSnapshots::default());
    let transport = Arc::new(FakeTransport::default());
    let sink = Arc::new(LogSink::new());
    let stream = Arc::new(client(transport.clone(), timing(Duration::from_secs(5))));
    let dashboard = Arc::new(Dashboard::new(snapshots.clone(), stream, sink.clone()));
    Harness {
        snapshots,
        transport,
        sink,
        dashboard,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn live_ticks_reach_store_and_sink() {
    let h = harness();
    h.snapshots.push(rows(&["BTCUSDT", "ETHUSDT"]));
    let frames = h.transport.push_open();

    h.dashboard.start(10).await.unwrap();
    settle().await;
    assert_eq!(h.sink.status().state, ConnectionState::Connected);

    frames
        .send(StreamFrame::Text(tick_json("ETHUSDT", "2999.99")))
        .unwrap();
    frames
        .send(StreamFrame::Text(tick_json("DOGEUSDT", "0.1")))
        .unwrap();
    settle().await;

    let tickers = h.dashboard.tickers();
    assert_eq!(tickers.len(), 2);
    assert_eq!(tickers[1].symbol, "ETHUSDT");
    assert_eq!(tickers[1].rank, 2);
    assert_eq!(tickers[1].fields.last_price, dec!(2999.99));
    assert_eq!(h.sink.status().updates, 1);
}

#[tokio::test(start_paused = true)]
async fn pending_reconnect_does_not_fire_after_update_count() {
    let h = harness();
    h.snapshots.push(rows(&["BTCUSDT"]));
    h.snapshots.push(rows(&["ETHUSDT", "SOLUSDT"]));
    let first = h.transport.push_open();
    let _second = h.transport.push_open();

    h.dashboard.start(5).await.unwrap();
    settle().await;

    drop(first);
    settle().await;
    assert_eq!(h.sink.status().state, ConnectionState::Reconnecting);

    let outcome = h.dashboard.update_count(6).await.unwrap();
    assert_eq!(outcome, RebuildOutcome::Applied { symbols: 2 });
    settle().await;

    tokio::time::advance(Duration::from_secs(30)).await;
    settle().await;

    assert_eq!(
        h.transport.urls(),
        [
            "ws://stream.test/ws/btcusdt@ticker",
            "ws://stream.test/ws/ethusdt@ticker/solusdt@ticker",
        ]
    );
    assert_eq!(h.sink.status().state, ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn stale_snapshot_is_discarded() {
    let h = harness();
    let release = h.snapshots.push_held(rows(&["BTCUSDT"]));
    h.snapshots.push(rows(&["ETHUSDT", "SOLUSDT"]));

    let dashboard = Arc::clone(&h.dashboard);
    let slow = tokio::spawn(async move { dashboard.start(5).await });
    settle().await;

    let fresh = h.dashboard.update_count(6).await.unwrap();
    assert_eq!(fresh, RebuildOutcome::Applied { symbols: 2 });

    release.send(()).unwrap();
    let stale = slow.await.unwrap().unwrap();
    assert_eq!(stale, RebuildOutcome::Superseded);
    settle().await;

    let symbols: Vec<_> = h.dashboard.tickers().into_iter().map(|t| t.symbol).collect();
    assert_eq!(symbols, ["ETHUSDT", "SOLUSDT"]);
    assert_eq!(h.transport.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_discards_in_flight_start() {
    let h = harness();
    let release = h.snapshots.push_held(rows(&["BTCUSDT"]));

    let dashboard = Arc::clone(&h.dashboard);
    let slow = tokio::spawn(async move { dashboard.start(5).await });
    settle().await;

    h.dashboard.shutdown();
    release.send(()).unwrap();

    assert_eq!(slow.await.unwrap().unwrap(), RebuildOutcome::Superseded);
    assert!(h.dashboard.tickers().is_empty());
    assert_eq!(h.transport.connects(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_start_is_not_retried() {
    let h = harness();

    let err = h.dashboard.start(10).await.unwrap_err();
    tokio::time::advance(Duration::from_secs(60)).await;
    settle().await;

    assert!(matches!(err, MarketDataError::Network(_)));
    assert_eq!(h.sink.status().state, ConnectionState::Failed);
    assert_eq!(h.sink.status().message, "Failed to load data");
    assert_eq!(h.transport.connects(), 0);
}
