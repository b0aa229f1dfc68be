//! Prometheus Metrics Module
//!
//! # Metrics Categories
//!
//! - **Snapshots**: REST fetches by outcome, discarded stale responses
//! - **Stream**: ticks received and dropped, connects, reconnects, errors
//! - **Store**: tracked symbol count
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the HTTP server port.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder and describe all metrics.
///
/// Repeated calls return the handle from the first successful call.
///
/// # Errors
///
/// Returns an error if another global recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Prometheus handle, if metrics have been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "ticker_snapshot_fetches_total",
        "REST snapshot fetches by outcome"
    );
    describe_histogram!(
        "ticker_snapshot_fetch_seconds",
        "REST snapshot fetch latency"
    );
    describe_counter!(
        "ticker_snapshots_discarded_total",
        "Snapshot responses discarded because a newer rebuild started"
    );

    describe_counter!("ticker_ticks_received_total", "Ticks decoded from the stream");
    describe_counter!(
        "ticker_ticks_dropped_total",
        "Ticks dropped by reason (unknown symbol, decode error)"
    );

    describe_counter!("ticker_stream_connects_total", "Stream connection attempts");
    describe_counter!("ticker_stream_reconnects_total", "Scheduled stream reconnects");
    describe_counter!("ticker_stream_errors_total", "Stream errors by type");

    describe_gauge!("ticker_tracked_symbols", "Symbols currently in the price store");
}

// =============================================================================
// Metric Labels
// =============================================================================

/// Outcome label for snapshot fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Rows decoded.
    Success,
    /// Transport failure or non-success status.
    NetworkError,
    /// Payload could not be decoded.
    FormatError,
}

impl FetchOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NetworkError => "network_error",
            Self::FormatError => "format_error",
        }
    }
}

/// Reason label for dropped ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Symbol not in the store.
    UnknownSymbol,
    /// Frame did not decode.
    DecodeError,
}

impl DropReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownSymbol => "unknown_symbol",
            Self::DecodeError => "decode_error",
        }
    }
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a snapshot fetch and its latency.
pub fn record_snapshot_fetch(outcome: FetchOutcome, duration: Duration) {
    counter!("ticker_snapshot_fetches_total", "outcome" => outcome.as_str()).increment(1);
    histogram!("ticker_snapshot_fetch_seconds").record(duration.as_secs_f64());
}

/// Record a snapshot discarded by a newer rebuild.
pub fn record_snapshot_discarded() {
    counter!("ticker_snapshots_discarded_total").increment(1);
}

/// Record a decoded tick.
pub fn record_tick_received() {
    counter!("ticker_ticks_received_total").increment(1);
}

/// Record a dropped tick.
pub fn record_tick_dropped(reason: DropReason) {
    counter!("ticker_ticks_dropped_total", "reason" => reason.as_str()).increment(1);
}

/// Record a stream connection attempt.
pub fn record_stream_connect() {
    counter!("ticker_stream_connects_total").increment(1);
}

/// Record a scheduled reconnect.
pub fn record_reconnect() {
    counter!("ticker_stream_reconnects_total").increment(1);
}

/// Record a stream error.
pub fn record_stream_error(error_type: &str) {
    counter!("ticker_stream_errors_total", "error_type" => error_type.to_string()).increment(1);
}

/// Update the tracked symbol gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_tracked_symbols(count: usize) {
    gauge!("ticker_tracked_symbols").set(count as f64);
}
