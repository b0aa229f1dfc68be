//! WebSocket Transport Integration Tests
//!
//! Subscribes through the real WebSocket transport to a local server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures_util::SinkExt;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

use ticker_stream::{ConnectionState, MarketDataClient, MarketDataClientConfig};

use common::{Recorder, symbols, tick_json, timing};

/// Accept one connection, send `frames`, then close it.
/// Resolves to the request path the client used.
async fn serve_once(frames: Vec<String>) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (path_tx, path_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            let _ = path_tx.send(request.uri().path().to_string());
            Ok(response)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(socket, callback)
            .await
            .unwrap();

        for frame in frames {
            ws.send(Message::Text(frame.into())).await.unwrap();
        }
        let _ = ws.close(None).await;
    });

    (format!("ws://{addr}/ws"), path_rx)
}

async fn wait_for(recorder: &Recorder, predicate: impl Fn(&Recorder) -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !predicate(recorder) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn streams_ticks_from_a_websocket_server() {
    let (url, path) = serve_once(vec![
        tick_json("BTCUSDT", "50100"),
        "{\"result\":null,\"id\":1}".to_string(),
        tick_json("ETHUSDT", "3010"),
    ])
    .await;

    let client = MarketDataClient::new(MarketDataClientConfig {
        ws_base_url: url,
        timing: timing(Duration::from_secs(60)),
        ..MarketDataClientConfig::default()
    })
    .unwrap();
    let recorder = Arc::new(Recorder::default());
    let subscription = client.subscribe(&symbols(&["BTCUSDT", "ETHUSDT"]), recorder.clone());

    wait_for(&recorder, |r| r.ticks().len() == 2).await;
    assert_eq!(path.await.unwrap(), "/ws/btcusdt@ticker/ethusdt@ticker");
    assert_eq!(recorder.ticks(), ["BTCUSDT", "ETHUSDT"]);

    wait_for(&recorder, |r| {
        r.states().last() == Some(&ConnectionState::Reconnecting)
    })
    .await;
    assert_eq!(
        recorder.states(),
        [
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Reconnecting,
        ]
    );

    subscription.close();
    assert_eq!(subscription.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn refused_connection_reports_failed() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = MarketDataClient::new(MarketDataClientConfig {
        ws_base_url: format!("ws://127.0.0.1:{port}/ws"),
        timing: timing(Duration::from_secs(60)),
        ..MarketDataClientConfig::default()
    })
    .unwrap();
    let recorder = Arc::new(Recorder::default());
    let _subscription = client.subscribe(&symbols(&["BTCUSDT"]), recorder.clone());

    wait_for(&recorder, |r| r.states().len() >= 3).await;
    assert_eq!(
        recorder.states(),
        [
            ConnectionState::Connecting,
            ConnectionState::Failed,
            ConnectionState::Reconnecting,
        ]
    );
}
