//! Market Data Integration
//!
//! Exchange client for the 24h ticker feed.
//!
//! # Components
//!
//! - [`MarketDataClient`]: REST snapshot and subscription factory
//! - [`Subscription`]: live stream handle with reconnect and refresh timers
//! - [`TungsteniteTransport`]: WebSocket [`StreamTransport`](crate::application::ports::StreamTransport)
//! - [`TickerCodec`]: JSON decoding for both endpoints
//! - [`ReconnectPolicy`]: reconnect delay schedule

pub mod client;
pub mod codec;
pub mod messages;
pub mod reconnect;
pub mod stream;
pub mod transport;

pub use client::{
    DEFAULT_QUOTE_SUFFIX, DEFAULT_REST_BASE_URL, DEFAULT_WS_BASE_URL, MarketDataClient,
    MarketDataClientConfig,
};
pub use codec::{TickerCodec, quote_pairs, rank_by_quote_volume};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
pub use stream::{StreamTiming, Subscription};
pub use transport::{TungsteniteTransport, into_frames};
