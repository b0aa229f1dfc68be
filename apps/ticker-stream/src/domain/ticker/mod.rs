//! Ticker Types
//!
//! Canonical 24-hour ticker rows, independent of the exchange wire format.
//!
//! A [`TickerSnapshot`] is created by the one-shot snapshot fetch and then
//! mutated in place by stream updates, which always carry a full set of
//! [`TickerFields`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A symbol string (e.g. `BTCUSDT`).
pub type Symbol = String;

// =============================================================================
// Ticker Fields
// =============================================================================

/// The seven numeric fields carried by every ticker update.
///
/// A stream message replaces all of them at once; there is no per-field merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TickerFields {
    /// Last traded price.
    pub last_price: Decimal,
    /// Absolute price change over the rolling 24h window (signed).
    pub price_change: Decimal,
    /// Percentage price change over the rolling 24h window (signed).
    pub price_change_percent: Decimal,
    /// 24h high.
    pub high_price: Decimal,
    /// 24h low.
    pub low_price: Decimal,
    /// 24h volume in the base asset.
    pub base_volume: Decimal,
    /// 24h volume in the quote asset.
    pub quote_volume: Decimal,
}

// =============================================================================
// Ticker Snapshot
// =============================================================================

/// One row of market data for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    /// Trading pair symbol, the sole identity of the row.
    pub symbol: Symbol,
    /// Base asset name (symbol with the quote suffix removed).
    pub name: String,
    /// 1-based rank by quote volume at snapshot time.
    ///
    /// Not recomputed from live updates.
    pub rank: u32,
    /// Numeric ticker fields.
    #[serde(flatten)]
    pub fields: TickerFields,
}

impl TickerSnapshot {
    /// Create a snapshot row.
    #[must_use]
    pub fn new(symbol: impl Into<Symbol>, name: impl Into<String>, rank: u32, fields: TickerFields) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            rank,
            fields,
        }
    }

    /// Whether the 24h change is non-negative.
    #[must_use]
    pub fn is_up(&self) -> bool {
        !self.fields.price_change_percent.is_sign_negative()
    }
}

// =============================================================================
// Pair Summary
// =============================================================================

/// Condensed view of a tradable pair, used for pair listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairSummary {
    /// Trading pair symbol.
    pub symbol: Symbol,
    /// Base asset name.
    pub name: String,
    /// Last traded price.
    pub last_price: Decimal,
    /// 24h percentage change.
    pub price_change_percent: Decimal,
    /// 24h quote volume.
    pub quote_volume: Decimal,
}

/// Strip the quote suffix from a symbol to get the base asset name.
///
/// Returns the symbol unchanged when it does not end with `suffix`.
#[must_use]
pub fn base_name(symbol: &str, suffix: &str) -> String {
    symbol
        .strip_suffix(suffix)
        .filter(|base| !base.is_empty())
        .unwrap_or(symbol)
        .to_string()
}
