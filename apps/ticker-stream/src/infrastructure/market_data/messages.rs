//! Exchange Wire Types
//!
//! Deserialization targets for the 24h ticker REST endpoint and the
//! `<symbol>@ticker` WebSocket stream. Numeric values arrive as JSON strings.
//!
//! # REST Row (`GET /ticker/24hr`)
//! ```json
//! {
//!   "symbol": "BTCUSDT",
//!   "priceChange": "-94.99",
//!   "priceChangePercent": "-0.095",
//!   "lastPrice": "99500.01",
//!   "highPrice": "100200.00",
//!   "lowPrice": "98800.00",
//!   "volume": "18200.4",
//!   "quoteVolume": "1812345678.9"
//! }
//! ```
//!
//! # Stream Message (`<symbol>@ticker`)
//! ```json
//! {"e":"24hrTicker","s":"BTCUSDT","p":"-94.99","P":"-0.095","c":"99500.01",
//!  "h":"100200.00","l":"98800.00","v":"18200.4","q":"1812345678.9"}
//! ```

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::ticker::TickerFields;

/// One row of the REST 24h ticker response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestTicker {
    /// Trading pair symbol.
    pub symbol: String,
    /// Last traded price.
    pub last_price: Decimal,
    /// 24h absolute change.
    pub price_change: Decimal,
    /// 24h percentage change.
    pub price_change_percent: Decimal,
    /// 24h high.
    pub high_price: Decimal,
    /// 24h low.
    pub low_price: Decimal,
    /// 24h base volume.
    pub volume: Decimal,
    /// 24h quote volume.
    pub quote_volume: Decimal,
}

impl RestTicker {
    /// Numeric fields of this row.
    #[must_use]
    pub const fn fields(&self) -> TickerFields {
        TickerFields {
            last_price: self.last_price,
            price_change: self.price_change,
            price_change_percent: self.price_change_percent,
            high_price: self.high_price,
            low_price: self.low_price,
            base_volume: self.volume,
            quote_volume: self.quote_volume,
        }
    }
}

/// One `24hrTicker` stream event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamTicker {
    /// Trading pair symbol.
    #[serde(rename = "s")]
    pub symbol: String,
    /// Last price.
    #[serde(rename = "c")]
    pub last_price: Decimal,
    /// 24h absolute change.
    #[serde(rename = "p")]
    pub price_change: Decimal,
    /// 24h percentage change.
    #[serde(rename = "P")]
    pub price_change_percent: Decimal,
    /// 24h high.
    #[serde(rename = "h")]
    pub high_price: Decimal,
    /// 24h low.
    #[serde(rename = "l")]
    pub low_price: Decimal,
    /// 24h base volume.
    #[serde(rename = "v")]
    pub base_volume: Decimal,
    /// 24h quote volume.
    #[serde(rename = "q")]
    pub quote_volume: Decimal,
}

impl StreamTicker {
    /// Numeric fields of this event.
    #[must_use]
    pub const fn fields(&self) -> TickerFields {
        TickerFields {
            last_price: self.last_price,
            price_change: self.price_change,
            price_change_percent: self.price_change_percent,
            high_price: self.high_price,
            low_price: self.low_price,
            base_volume: self.base_volume,
            quote_volume: self.quote_volume,
        }
    }
}

/// Stream payload: either a raw event (`/ws/...`) or the combined-stream
/// envelope (`/stream?streams=...`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StreamPayload {
    /// `{"stream": "btcusdt@ticker", "data": {...}}`
    Combined {
        /// Stream name.
        stream: String,
        /// Wrapped event.
        data: StreamTicker,
    },
    /// Bare event.
    Raw(StreamTicker),
}

impl StreamPayload {
    /// The wrapped ticker event.
    #[must_use]
    pub fn into_ticker(self) -> StreamTicker {
        match self {
            Self::Combined { data, .. } => data,
            Self::Raw(ticker) => ticker,
        }
    }
}
