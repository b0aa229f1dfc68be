//! Ticker Subscription
//!
//! One [`Subscription`] owns one connection task. The task connects through a
//! [`StreamTransport`], decodes ticks, and reconnects when the stream ends.
//!
//! # State Machine
//!
//! ```text
//! idle ──▶ connecting ──▶ connected ──(refresh timer)──▶ connecting
//!              ▲               │
//!              │        (close / timeout)        (error / connect failure)
//!              │               ▼                          ▼
//!              └──────── reconnecting ◀──────────────── failed
//!
//! any state ──close()──▶ closed
//! ```
//!
//! # Delivery Gate
//!
//! Every observer call passes through a re-entrant gate shared with
//! [`Subscription::close`]. Once `close` returns, the gate is shut and no
//! further tick or status reaches the observer. Because the gate is
//! re-entrant, an observer may close its own subscription from a callback.

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::ReentrantMutex;
use tokio_util::sync::CancellationToken;

use super::codec::TickerCodec;
use super::reconnect::{ReconnectConfig, ReconnectPolicy};
use crate::application::ports::{
    FrameStream, StreamFrame, StreamHandle, StreamObserver, StreamTransport,
};
use crate::domain::subscription::{ConnectionState, SubscriptionSet, TerminationReason};
use crate::domain::ticker::TickerFields;
use crate::infrastructure::metrics::{self, DropReason};

// =============================================================================
// Delivery Gate
// =============================================================================

#[derive(Debug, Default)]
struct GateState {
    closed: bool,
    state: ConnectionState,
}

struct DeliveryGate {
    inner: ReentrantMutex<RefCell<GateState>>,
    observer: Arc<dyn StreamObserver>,
}

impl DeliveryGate {
    fn new(observer: Arc<dyn StreamObserver>) -> Self {
        Self {
            inner: ReentrantMutex::new(RefCell::new(GateState::default())),
            observer,
        }
    }

    /// Record and deliver a state change. Returns `false` once closed.
    fn status(&self, state: ConnectionState, message: &str) -> bool {
        let guard = self.inner.lock();
        {
            let mut gate = guard.borrow_mut();
            if gate.closed {
                return false;
            }
            gate.state = state;
        }
        self.observer.on_status(state, message);
        true
    }

    /// Deliver a tick. Returns `false` once closed.
    fn tick(&self, symbol: &str, fields: &TickerFields) -> bool {
        let guard = self.inner.lock();
        if guard.borrow().closed {
            return false;
        }
        self.observer.on_tick(symbol, fields);
        true
    }

    /// Shut the gate. Returns `true` on the first call only.
    fn close(&self) -> bool {
        let guard = self.inner.lock();
        let mut gate = guard.borrow_mut();
        if gate.closed {
            return false;
        }
        gate.closed = true;
        gate.state = ConnectionState::Closed;
        true
    }

    fn state(&self) -> ConnectionState {
        self.inner.lock().borrow().state
    }
}

// =============================================================================
// Connection Settings
// =============================================================================

/// Timing settings for one subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamTiming {
    /// Reconnect delay schedule.
    pub reconnect: ReconnectConfig,
    /// Age at which a healthy connection is proactively re-opened.
    pub refresh_interval: Duration,
    /// End the connection when no frame arrives for this long.
    pub idle_timeout: Option<Duration>,
}

impl Default for StreamTiming {
    fn default() -> Self {
        Self {
            reconnect: ReconnectConfig::default(),
            refresh_interval: Duration::from_secs(23 * 60 * 60),
            idle_timeout: None,
        }
    }
}

// =============================================================================
// Subscription Handle
// =============================================================================

/// Handle to a live ticker subscription.
///
/// Dropping the handle closes the subscription.
pub struct Subscription {
    gate: Arc<DeliveryGate>,
    cancel: CancellationToken,
    symbols: SubscriptionSet,
}

impl Subscription {
    /// Spawn the connection task for `symbols` at `url`.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn(
        url: String,
        symbols: SubscriptionSet,
        transport: Arc<dyn StreamTransport>,
        timing: StreamTiming,
        observer: Arc<dyn StreamObserver>,
    ) -> Self {
        let gate = Arc::new(DeliveryGate::new(observer));
        let cancel = CancellationToken::new();

        let task = ConnectionTask {
            url,
            transport,
            codec: TickerCodec::new(),
            timing,
            gate: Arc::clone(&gate),
            cancel: cancel.clone(),
        };
        tokio::spawn(task.run());

        Self {
            gate,
            cancel,
            symbols,
        }
    }

    /// Stop the subscription.
    ///
    /// Idempotent and terminal. No observer call happens after this returns.
    pub fn close(&self) {
        if self.gate.close() {
            tracing::debug!(symbols = self.symbols.len(), "Closing ticker subscription");
        }
        self.cancel.cancel();
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.gate.state()
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Symbols streamed by this subscription.
    #[must_use]
    pub const fn symbols(&self) -> &SubscriptionSet {
        &self.symbols
    }
}

impl StreamHandle for Subscription {
    fn close(&self) {
        Self::close(self);
    }

    fn state(&self) -> ConnectionState {
        Self::state(self)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("symbols", &self.symbols.symbols())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Connection Task
// =============================================================================

enum PumpExit {
    Cancelled,
    Refresh,
    Ended(TerminationReason),
}

struct ConnectionTask {
    url: String,
    transport: Arc<dyn StreamTransport>,
    codec: TickerCodec,
    timing: StreamTiming,
    gate: Arc<DeliveryGate>,
    cancel: CancellationToken,
}

impl ConnectionTask {
    async fn run(self) {
        let mut policy = ReconnectPolicy::new(self.timing.reconnect.clone());

        loop {
            if self.cancel.is_cancelled()
                || !self.gate.status(ConnectionState::Connecting, "Connecting to ticker stream")
            {
                return;
            }

            tracing::info!(url = %self.url, "Connecting to ticker stream");
            metrics::record_stream_connect();

            let connected = tokio::select! {
                () = self.cancel.cancelled() => return,
                result = self.transport.connect(&self.url) => result,
            };

            let reason = match connected {
                Ok(frames) => {
                    policy.reset();
                    if !self
                        .gate
                        .status(ConnectionState::Connected, "Connected - Live updates active")
                    {
                        return;
                    }
                    tracing::info!("Ticker stream connected");

                    match self.pump(frames).await {
                        PumpExit::Cancelled => return,
                        PumpExit::Refresh => {
                            tracing::info!(
                                after_secs = self.timing.refresh_interval.as_secs(),
                                "Refreshing ticker stream connection"
                            );
                            continue;
                        }
                        PumpExit::Ended(reason) => reason,
                    }
                }
                Err(e) => TerminationReason::Error(e.to_string()),
            };

            if !self.on_termination(&reason) {
                return;
            }

            let Some(delay) = policy.next_delay() else {
                tracing::error!(
                    attempts = policy.attempt_count(),
                    "Reconnect attempts exhausted, giving up"
                );
                self.gate
                    .status(ConnectionState::Failed, "Reconnect attempts exhausted");
                return;
            };

            metrics::record_reconnect();
            tracing::info!(
                attempt = policy.attempt_count(),
                delay_ms = delay.as_millis(),
                "Reconnecting to ticker stream"
            );
            if !self.gate.status(ConnectionState::Reconnecting, "Reconnecting...") {
                return;
            }

            tokio::select! {
                () = self.cancel.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Report a connection end. Returns `false` if the gate is closed.
    fn on_termination(&self, reason: &TerminationReason) -> bool {
        match reason {
            TerminationReason::Error(message) => {
                tracing::warn!(error = %message, "Ticker stream error");
                metrics::record_stream_error(reason.as_str());
                self.gate.status(ConnectionState::Failed, message)
            }
            TerminationReason::Timeout => {
                tracing::warn!("Ticker stream idle timeout");
                metrics::record_stream_error(reason.as_str());
                true
            }
            TerminationReason::NormalClose => {
                tracing::info!("Ticker stream closed");
                true
            }
        }
    }

    async fn pump(&self, mut frames: FrameStream) -> PumpExit {
        let refresh = tokio::time::sleep(self.timing.refresh_interval);
        tokio::pin!(refresh);

        loop {
            let idle = async {
                match self.timing.idle_timeout {
                    Some(timeout) => tokio::time::sleep(timeout).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return PumpExit::Cancelled,
                () = &mut refresh => return PumpExit::Refresh,
                frame = frames.next() => match frame {
                    Some(StreamFrame::Text(text)) => {
                        if !self.deliver(&text) {
                            return PumpExit::Cancelled;
                        }
                    }
                    Some(StreamFrame::Terminated(reason)) => return PumpExit::Ended(reason),
                    None => return PumpExit::Ended(TerminationReason::NormalClose),
                },
                () = idle => return PumpExit::Ended(TerminationReason::Timeout),
            }
        }
    }

    /// Decode and deliver one frame. Returns `false` if the gate is closed.
    fn deliver(&self, text: &str) -> bool {
        match self.codec.decode_tick(text) {
            Ok((symbol, fields)) => {
                metrics::record_tick_received();
                self.gate.tick(&symbol, &fields)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable stream message");
                metrics::record_tick_dropped(DropReason::DecodeError);
                true
            }
        }
    }
}
