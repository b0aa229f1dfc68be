//! Log Presentation Sink
//!
//! [`PresentationSink`] that renders dashboard output as structured log
//! lines and remembers the latest status for the HTTP surface.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::application::ports::PresentationSink;
use crate::domain::subscription::ConnectionState;
use crate::domain::ticker::{TickerFields, TickerSnapshot};

/// Latest status reported to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Connection state.
    pub state: ConnectionState,
    /// Human-readable status line.
    pub message: String,
    /// When the status was reported.
    pub since: DateTime<Utc>,
    /// Live updates rendered since the last snapshot.
    pub updates: u64,
}

impl Default for StatusReport {
    fn default() -> Self {
        Self {
            state: ConnectionState::Idle,
            message: "Not started".to_string(),
            since: Utc::now(),
            updates: 0,
        }
    }
}

/// Sink that logs every event through `tracing`.
#[derive(Debug, Default)]
pub struct LogSink {
    status: RwLock<StatusReport>,
}

impl LogSink {
    /// Create a sink in the idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest status.
    #[must_use]
    pub fn status(&self) -> StatusReport {
        self.status.read().clone()
    }
}

impl PresentationSink for LogSink {
    fn on_snapshot(&self, tickers: &[TickerSnapshot]) {
        self.status.write().updates = 0;

        tracing::info!(rows = tickers.len(), "Rendering snapshot");
        for ticker in tickers {
            tracing::info!(
                rank = ticker.rank,
                symbol = %ticker.symbol,
                price = %ticker.fields.last_price,
                change_pct = %ticker.fields.price_change_percent,
                volume = %ticker.fields.quote_volume,
                "Ticker"
            );
        }
    }

    fn on_update(&self, symbol: &str, fields: &TickerFields) {
        self.status.write().updates += 1;

        tracing::debug!(
            symbol,
            price = %fields.last_price,
            change_pct = %fields.price_change_percent,
            high = %fields.high_price,
            low = %fields.low_price,
            "Ticker update"
        );
    }

    fn on_status(&self, state: ConnectionState, message: &str) {
        {
            let mut status = self.status.write();
            status.state = state;
            status.message = message.to_string();
            status.since = Utc::now();
        }

        match state {
            ConnectionState::Failed => tracing::warn!(%state, detail = message, "Status"),
            _ => tracing::info!(%state, detail = message, "Status"),
        }
    }
}
