#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Ticker Stream - Live Crypto Ticker Dashboard
//!
//! Loads a ranked snapshot of the most-traded quote pairs over REST, keeps it
//! live over a multiplexed WebSocket ticker stream, and serves the result to
//! a presentation sink and a small HTTP surface.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Core ticker types and state
//!   - `ticker`: Ticker rows and numeric fields
//!   - `store`: Price state keyed by symbol
//!   - `subscription`: Symbol sets and connection states
//!   - `preferences`: Display preferences and ordering
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Snapshot, stream, transport and presentation interfaces
//!   - `services`: The dashboard orchestrator
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `market_data`: REST and WebSocket exchange client
//!   - `presentation`: Log-based sink
//!   - `preferences`: File-backed preference storage
//!   - `http`: Dashboard, health and metrics endpoints
//!   - `config`, `metrics`, `telemetry`: Ambient setup
//!
//! # Data Flow
//!
//! ```text
//! REST /ticker/24hr ──▶ snapshot ──▶ PriceStore ──▶ PresentationSink
//!                                        ▲
//! WS <symbol>@ticker ──▶ Subscription ───┘ (ticks, status)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core ticker types with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::preferences::{Preferences, SortBy, arrange};
pub use domain::store::{PriceStore, SharedPriceStore};
pub use domain::subscription::{
    ConnectionState, SubscriptionSet, SubscriptionSetError, TerminationReason,
};
pub use domain::ticker::{PairSummary, Symbol, TickerFields, TickerSnapshot};

// Ports and services
pub use application::ports::{
    FrameStream, MarketDataError, PresentationSink, SnapshotProvider, StreamFrame, StreamHandle,
    StreamObserver, StreamTransport, TickerStream,
};
pub use application::services::{Dashboard, RebuildOutcome};

// Infrastructure config
pub use infrastructure::config::{
    ConfigError, PreferenceSettings, RestSettings, ServerSettings, StreamSettings, TickerConfig,
};

// Market data client
pub use infrastructure::market_data::{
    MarketDataClient, MarketDataClientConfig, ReconnectConfig, StreamTiming, Subscription,
    TungsteniteTransport,
};

// HTTP server
pub use infrastructure::http::{HttpServer, HttpServerError, HttpState, create_router};

// Preferences and presentation
pub use infrastructure::preferences::{PreferenceError, PreferenceStore};
pub use infrastructure::presentation::{LogSink, StatusReport};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
