//! Subscription Types
//!
//! Domain types describing what is streamed and how the stream is doing:
//!
//! - [`SubscriptionSet`]: ordered, duplicate-free, non-empty symbol list
//! - [`ConnectionState`]: lifecycle state of one subscription handle
//! - [`TerminationReason`]: why a single stream connection ended

use std::fmt;

use serde::Serialize;

use crate::domain::store::PriceStore;
use crate::domain::ticker::Symbol;

// =============================================================================
// Subscription Set
// =============================================================================

/// The ordered set of symbols streamed by one subscription.
///
/// Built once per subscribe cycle and replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSet {
    symbols: Vec<Symbol>,
}

impl SubscriptionSet {
    /// Build a set from an ordered symbol list.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionSetError::Empty`] for an empty list and
    /// [`SubscriptionSetError::Duplicate`] if any symbol repeats.
    pub fn new(symbols: Vec<Symbol>) -> Result<Self, SubscriptionSetError> {
        if symbols.is_empty() {
            return Err(SubscriptionSetError::Empty);
        }

        let mut seen = std::collections::HashSet::with_capacity(symbols.len());
        for symbol in &symbols {
            if !seen.insert(symbol.as_str()) {
                return Err(SubscriptionSetError::Duplicate(symbol.clone()));
            }
        }

        Ok(Self { symbols })
    }

    /// Derive the set from the current store content, in store order.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionSetError::Empty`] when the store is empty.
    pub fn from_store(store: &PriceStore) -> Result<Self, SubscriptionSetError> {
        Self::new(store.symbols())
    }

    /// Symbols in subscription order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Number of symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the set holds no symbols.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Whether `symbol` is part of the set.
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    /// Join one stream name per symbol with `/`.
    ///
    /// Stream names are the lower-cased symbol followed by `stream_suffix`,
    /// e.g. `btcusdt@ticker/ethusdt@ticker`.
    #[must_use]
    pub fn stream_path(&self, stream_suffix: &str) -> String {
        self.symbols
            .iter()
            .map(|symbol| format!("{}{stream_suffix}", symbol.to_lowercase()))
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Invalid subscription set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionSetError {
    /// No symbols to stream.
    #[error("subscription set is empty")]
    Empty,
    /// A symbol occurs more than once.
    #[error("duplicate symbol in subscription set: {0}")]
    Duplicate(Symbol),
}

// =============================================================================
// Connection State
// =============================================================================

/// Lifecycle state of a streaming subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Created, no connection attempted yet.
    #[default]
    Idle,
    /// Opening the stream.
    Connecting,
    /// Stream open and delivering ticks.
    Connected,
    /// Stream ended; waiting for the reconnect timer.
    Reconnecting,
    /// Transport error, or reconnect attempts exhausted.
    Failed,
    /// Explicitly closed. Terminal.
    Closed,
}

impl ConnectionState {
    /// Lower-case state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Failed => "failed",
            Self::Closed => "closed",
        }
    }

    /// Whether the stream is delivering live data.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Termination Reason
// =============================================================================

/// Why a stream connection ended.
///
/// Close and error are folded into one event so a single handler decides
/// what happens next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// Peer closed the stream, or the stream ended.
    NormalClose,
    /// Transport-level error.
    Error(String),
    /// No frame arrived within the idle window.
    Timeout,
}

impl TerminationReason {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NormalClose => "normal_close",
            Self::Error(_) => "error",
            Self::Timeout => "timeout",
        }
    }
}
