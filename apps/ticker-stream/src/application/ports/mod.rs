//! Port Interfaces
//!
//! Contracts between the dashboard orchestrator and the outside world,
//! following the Hexagonal Architecture pattern.
//!
//! ## Driven Ports (Outbound)
//!
//! - [`SnapshotProvider`]: one-shot ticker snapshot
//! - [`TickerStream`]: live ticker subscription
//! - [`StreamTransport`]: raw text-frame connection used by the stream client
//! - [`PresentationSink`]: where rendered data and status go
//!
//! ## Observer
//!
//! - [`StreamObserver`]: receives ticks and status from one subscription.
//!   Registration is explicit; dropping or closing the returned
//!   [`StreamHandle`] is the unsubscribe.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::domain::subscription::{
    ConnectionState, SubscriptionSet, SubscriptionSetError, TerminationReason,
};
use crate::domain::ticker::{PairSummary, TickerFields, TickerSnapshot};

// =============================================================================
// Errors
// =============================================================================

/// Market data errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketDataError {
    /// Transport failure or non-success HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// Payload did not match the expected shape.
    #[error("data format error: {0}")]
    DataFormat(String),

    /// Transport error on a streaming connection.
    #[error("stream error: {0}")]
    Stream(String),

    /// The symbol set cannot be streamed.
    #[error("invalid subscription: {0}")]
    InvalidSubscription(#[from] SubscriptionSetError),
}

impl MarketDataError {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::DataFormat(_) => "data_format",
            Self::Stream(_) => "stream",
            Self::InvalidSubscription(_) => "invalid_subscription",
        }
    }
}

// =============================================================================
// Snapshot Port
// =============================================================================

/// One-shot market snapshots.
///
/// Implementations never retry; failures surface immediately.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Fetch the top `count` pairs, ranked by descending quote volume.
    async fn fetch_snapshot(&self, count: usize) -> Result<Vec<TickerSnapshot>, MarketDataError>;

    /// List every quoted pair, by descending quote volume.
    async fn fetch_quote_pairs(&self) -> Result<Vec<PairSummary>, MarketDataError>;
}

// =============================================================================
// Stream Ports
// =============================================================================

/// Receives events from one subscription.
///
/// Calls come from the subscription's connection task, one at a time.
/// It is safe to close the subscription from inside either method.
pub trait StreamObserver: Send + Sync {
    /// A ticker update arrived.
    fn on_tick(&self, symbol: &str, fields: &TickerFields);

    /// The connection state changed.
    fn on_status(&self, state: ConnectionState, message: &str);
}

/// Handle to a live subscription.
pub trait StreamHandle: Send + Sync {
    /// Stop the subscription. Idempotent; terminal.
    fn close(&self);

    /// Current connection state.
    fn state(&self) -> ConnectionState;
}

/// Live ticker subscriptions.
pub trait TickerStream: Send + Sync {
    /// Start streaming `symbols`, delivering events to `observer`.
    fn subscribe(
        &self,
        symbols: &SubscriptionSet,
        observer: Arc<dyn StreamObserver>,
    ) -> Box<dyn StreamHandle>;
}

/// A frame delivered by a [`StreamTransport`] connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// A text payload.
    Text(String),
    /// The connection ended. No frames follow.
    Terminated(TerminationReason),
}

/// Frames of one open connection. Dropping it closes the connection.
pub type FrameStream = BoxStream<'static, StreamFrame>;

/// Opens raw streaming connections.
#[async_trait]
pub trait StreamTransport: Send + Sync + 'static {
    /// Open a connection to `url`.
    async fn connect(&self, url: &str) -> Result<FrameStream, MarketDataError>;
}

// =============================================================================
// Presentation Port
// =============================================================================

/// Destination for dashboard output.
#[cfg_attr(test, mockall::automock)]
pub trait PresentationSink: Send + Sync {
    /// A fresh snapshot was loaded; render all rows.
    fn on_snapshot(&self, tickers: &[TickerSnapshot]);

    /// One row received live values.
    fn on_update(&self, symbol: &str, fields: &TickerFields);

    /// Connectivity changed.
    fn on_status(&self, state: ConnectionState, message: &str);
}
