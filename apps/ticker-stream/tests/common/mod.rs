//! Shared fixtures for integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use ticker_stream::{
    ConnectionState, FrameStream, MarketDataClient, MarketDataClientConfig, MarketDataError,
    ReconnectConfig, StreamFrame, StreamObserver, StreamTiming, StreamTransport, SubscriptionSet,
    TickerFields,
};

// =============================================================================
// Scripted Transport
// =============================================================================

enum Script {
    Open(mpsc::UnboundedReceiver<StreamFrame>),
    Fail(String),
}

/// Stream transport whose connections are scripted by the test.
///
/// Each `connect` consumes the next scripted outcome. With nothing scripted
/// the connection opens and stays silent.
#[derive(Default)]
pub struct FakeTransport {
    scripts: Mutex<VecDeque<Script>>,
    urls: Mutex<Vec<String>>,
}

impl FakeTransport {
    /// Script a successful connection; frames sent on the returned sender
    /// are delivered on it.
    pub fn push_open(&self) -> mpsc::UnboundedSender<StreamFrame> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.scripts.lock().push_back(Script::Open(rx));
        tx
    }

    /// Script a failed connection attempt.
    pub fn push_fail(&self, message: &str) {
        self.scripts
            .lock()
            .push_back(Script::Fail(message.to_string()));
    }

    /// Number of connection attempts so far.
    pub fn connects(&self) -> usize {
        self.urls.lock().len()
    }

    /// URLs of every attempt, in order.
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }
}

#[async_trait]
impl StreamTransport for FakeTransport {
    async fn connect(&self, url: &str) -> Result<FrameStream, MarketDataError> {
        self.urls.lock().push(url.to_string());
        let script = self.scripts.lock().pop_front();

        match script {
            Some(Script::Open(rx)) => Ok(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|frame| (frame, rx))
            })
            .boxed()),
            Some(Script::Fail(message)) => Err(MarketDataError::Stream(message)),
            None => Ok(stream::pending().boxed()),
        }
    }
}

// =============================================================================
// Recording Observer
// =============================================================================

/// One observer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Tick(String, TickerFields),
    Status(ConnectionState, String),
}

/// Observer that records every call.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn states(&self) -> Vec<ConnectionState> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Status(state, _) => Some(*state),
                Event::Tick(..) => None,
            })
            .collect()
    }

    pub fn ticks(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Tick(symbol, _) => Some(symbol.clone()),
                Event::Status(..) => None,
            })
            .collect()
    }
}

impl StreamObserver for Recorder {
    fn on_tick(&self, symbol: &str, fields: &TickerFields) {
        self.events
            .lock()
            .push(Event::Tick(symbol.to_string(), *fields));
    }

    fn on_status(&self, state: ConnectionState, message: &str) {
        self.events
            .lock()
            .push(Event::Status(state, message.to_string()));
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Client over `transport` with the given timing and placeholder endpoints.
pub fn client(transport: Arc<FakeTransport>, timing: StreamTiming) -> MarketDataClient {
    let config = MarketDataClientConfig {
        rest_base_url: "http://127.0.0.1:9/api/v3".to_string(),
        ws_base_url: "ws://stream.test/ws".to_string(),
        timing,
        ..MarketDataClientConfig::default()
    };
    MarketDataClient::with_transport(config, transport).unwrap()
}

/// Fixed reconnect delay, no refresh within the test horizon.
pub fn timing(reconnect_delay: Duration) -> StreamTiming {
    StreamTiming {
        reconnect: ReconnectConfig::fixed(reconnect_delay),
        refresh_interval: Duration::from_secs(24 * 60 * 60),
        idle_timeout: None,
    }
}

pub fn symbols(list: &[&str]) -> SubscriptionSet {
    SubscriptionSet::new(list.iter().map(ToString::to_string).collect()).unwrap()
}

/// A `24hrTicker` stream event.
pub fn tick_json(symbol: &str, last_price: &str) -> String {
    serde_json::json!({
        "e": "24hrTicker",
        "s": symbol,
        "p": "12.50",
        "P": "1.25",
        "c": last_price,
        "h": "1100.00",
        "l": "900.00",
        "v": "5000",
        "q": "5000000"
    })
    .to_string()
}

/// A REST 24h ticker row.
pub fn rest_row(symbol: &str, last_price: &str, quote_volume: &str) -> serde_json::Value {
    serde_json::json!({
        "symbol": symbol,
        "priceChange": "1.00",
        "priceChangePercent": "0.50",
        "lastPrice": last_price,
        "highPrice": last_price,
        "lowPrice": last_price,
        "volume": "100",
        "quoteVolume": quote_volume
    })
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
