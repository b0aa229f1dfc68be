//! Market Data Client
//!
//! REST snapshot fetch and WebSocket ticker subscriptions against an
//! exchange exposing the `/ticker/24hr` endpoint and `<symbol>@ticker`
//! streams.
//!
//! # Endpoints
//!
//! - REST: `{rest_base_url}/ticker/24hr`
//! - Stream: `{ws_base_url}/btcusdt@ticker/ethusdt@ticker/...`

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::codec::{TickerCodec, quote_pairs, rank_by_quote_volume};
use super::messages::RestTicker;
use super::reconnect::ReconnectConfig;
use super::stream::{StreamTiming, Subscription};
use super::transport::TungsteniteTransport;
use crate::application::ports::{
    MarketDataError, SnapshotProvider, StreamHandle, StreamObserver, StreamTransport, TickerStream,
};
use crate::domain::subscription::SubscriptionSet;
use crate::domain::ticker::{PairSummary, TickerSnapshot};
use crate::infrastructure::config::TickerConfig;
use crate::infrastructure::metrics::{self, FetchOutcome};

/// Default REST base URL.
pub const DEFAULT_REST_BASE_URL: &str = "https://api.binance.com/api/v3";

/// Default WebSocket base URL.
pub const DEFAULT_WS_BASE_URL: &str = "wss://stream.binance.com:9443/ws";

/// Default quote asset suffix.
pub const DEFAULT_QUOTE_SUFFIX: &str = "USDT";

const STREAM_SUFFIX: &str = "@ticker";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the market data client.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDataClientConfig {
    /// REST API base URL.
    pub rest_base_url: String,
    /// WebSocket base URL.
    pub ws_base_url: String,
    /// Quote asset suffix used to filter pairs.
    pub quote_suffix: String,
    /// REST request timeout.
    pub http_timeout: Duration,
    /// Stream reconnect and refresh timing.
    pub timing: StreamTiming,
}

impl Default for MarketDataClientConfig {
    fn default() -> Self {
        Self {
            rest_base_url: DEFAULT_REST_BASE_URL.to_string(),
            ws_base_url: DEFAULT_WS_BASE_URL.to_string(),
            quote_suffix: DEFAULT_QUOTE_SUFFIX.to_string(),
            http_timeout: Duration::from_secs(10),
            timing: StreamTiming::default(),
        }
    }
}

impl MarketDataClientConfig {
    /// Build from the service configuration.
    #[must_use]
    pub fn from_config(config: &TickerConfig) -> Self {
        Self {
            rest_base_url: config.rest.base_url.clone(),
            ws_base_url: config.stream.base_url.clone(),
            quote_suffix: config.rest.quote_suffix.clone(),
            http_timeout: config.rest.http_timeout,
            timing: StreamTiming {
                reconnect: ReconnectConfig::from_settings(&config.stream),
                refresh_interval: config.stream.refresh_interval,
                idle_timeout: config.stream.idle_timeout,
            },
        }
    }

    /// Snapshot endpoint URL.
    #[must_use]
    pub fn snapshot_url(&self) -> String {
        format!("{}/ticker/24hr", self.rest_base_url.trim_end_matches('/'))
    }

    /// Stream URL multiplexing every symbol in `symbols`.
    #[must_use]
    pub fn stream_url(&self, symbols: &SubscriptionSet) -> String {
        format!(
            "{}/{}",
            self.ws_base_url.trim_end_matches('/'),
            symbols.stream_path(STREAM_SUFFIX)
        )
    }
}

// =============================================================================
// Client
// =============================================================================

/// Market data client: one-shot snapshots plus live subscriptions.
pub struct MarketDataClient {
    config: MarketDataClientConfig,
    http_client: reqwest::Client,
    transport: Arc<dyn StreamTransport>,
    codec: TickerCodec,
}

impl std::fmt::Debug for MarketDataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MarketDataClient {
    /// Create a client that streams over WebSockets.
    ///
    /// # Errors
    ///
    /// Returns [`MarketDataError::Network`] if the HTTP client cannot be built.
    pub fn new(config: MarketDataClientConfig) -> Result<Self, MarketDataError> {
        Self::with_transport(config, Arc::new(TungsteniteTransport::new()))
    }

    /// Create a client with a custom stream transport.
    ///
    /// # Errors
    ///
    /// Returns [`MarketDataError::Network`] if the HTTP client cannot be built.
    pub fn with_transport(
        config: MarketDataClientConfig,
        transport: Arc<dyn StreamTransport>,
    ) -> Result<Self, MarketDataError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
            transport,
            codec: TickerCodec::new(),
        })
    }

    /// Client configuration.
    #[must_use]
    pub const fn config(&self) -> &MarketDataClientConfig {
        &self.config
    }

    /// Fetch the top `count` quote pairs by descending quote volume.
    ///
    /// # Errors
    ///
    /// [`MarketDataError::Network`] on transport failure or non-success
    /// status, [`MarketDataError::DataFormat`] on an undecodable body.
    pub async fn fetch_snapshot(&self, count: usize) -> Result<Vec<TickerSnapshot>, MarketDataError> {
        let rows = self.fetch_rows().await?;
        let snapshot = rank_by_quote_volume(rows, &self.config.quote_suffix, count);

        tracing::debug!(requested = count, returned = snapshot.len(), "Snapshot ranked");
        Ok(snapshot)
    }

    /// Fetch every quote pair, by descending quote volume.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_snapshot`](Self::fetch_snapshot).
    pub async fn fetch_quote_pairs(&self) -> Result<Vec<PairSummary>, MarketDataError> {
        let rows = self.fetch_rows().await?;
        Ok(quote_pairs(rows, &self.config.quote_suffix))
    }

    /// Open a live subscription for `symbols`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(
        &self,
        symbols: &SubscriptionSet,
        observer: Arc<dyn StreamObserver>,
    ) -> Subscription {
        let url = self.config.stream_url(symbols);
        tracing::info!(symbols = symbols.len(), "Subscribing to ticker stream");

        Subscription::spawn(
            url,
            symbols.clone(),
            Arc::clone(&self.transport),
            self.config.timing.clone(),
            observer,
        )
    }

    async fn fetch_rows(&self) -> Result<Vec<RestTicker>, MarketDataError> {
        let url = self.config.snapshot_url();
        let started = Instant::now();

        let result = self.request_rows(&url).await;

        let outcome = match &result {
            Ok(_) => FetchOutcome::Success,
            Err(MarketDataError::DataFormat(_)) => FetchOutcome::FormatError,
            Err(_) => FetchOutcome::NetworkError,
        };
        metrics::record_snapshot_fetch(outcome, started.elapsed());

        if let Err(e) = &result {
            tracing::warn!(%url, error = %e, "Snapshot fetch failed");
        }
        result
    }

    async fn request_rows(&self, url: &str) -> Result<Vec<RestTicker>, MarketDataError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::Network(format!(
                "snapshot request failed ({status}): {body}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        self.codec.decode_snapshot(&body)
    }
}

#[async_trait]
impl SnapshotProvider for MarketDataClient {
    async fn fetch_snapshot(&self, count: usize) -> Result<Vec<TickerSnapshot>, MarketDataError> {
        Self::fetch_snapshot(self, count).await
    }

    async fn fetch_quote_pairs(&self) -> Result<Vec<PairSummary>, MarketDataError> {
        Self::fetch_quote_pairs(self).await
    }
}

impl TickerStream for MarketDataClient {
    fn subscribe(
        &self,
        symbols: &SubscriptionSet,
        observer: Arc<dyn StreamObserver>,
    ) -> Box<dyn StreamHandle> {
        Box::new(Self::subscribe(self, symbols, observer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(symbols: &[&str]) -> SubscriptionSet {
        SubscriptionSet::new(symbols.iter().map(ToString::to_string).collect()).unwrap()
    }

    #[test]
    fn default_endpoints() {
        let config = MarketDataClientConfig::default();
        assert_eq!(
            config.snapshot_url(),
            "https://api.binance.com/api/v3/ticker/24hr"
        );
        assert_eq!(
            config.stream_url(&set(&["BTCUSDT", "ETHUSDT"])),
            "wss://stream.binance.com:9443/ws/btcusdt@ticker/ethusdt@ticker"
        );
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let config = MarketDataClientConfig {
            rest_base_url: "http://127.0.0.1:9000/".to_string(),
            ws_base_url: "ws://127.0.0.1:9001/ws/".to_string(),
            ..MarketDataClientConfig::default()
        };
        assert_eq!(config.snapshot_url(), "http://127.0.0.1:9000/ticker/24hr");
        assert_eq!(
            config.stream_url(&set(&["SOLUSDT"])),
            "ws://127.0.0.1:9001/ws/solusdt@ticker"
        );
    }

    #[test]
    fn client_builds_with_defaults() {
        let client = MarketDataClient::new(MarketDataClientConfig::default()).unwrap();
        assert_eq!(client.config().quote_suffix, "USDT");
    }
}
