//! Ticker Codec
//!
//! Decodes REST snapshots and stream events, and turns the raw REST rows
//! into ranked [`TickerSnapshot`]s.

use crate::application::ports::MarketDataError;
use crate::domain::ticker::{PairSummary, Symbol, TickerFields, TickerSnapshot, base_name};

use super::messages::{RestTicker, StreamPayload};

/// JSON codec for the ticker REST endpoint and stream.
#[derive(Debug, Default, Clone)]
pub struct TickerCodec;

impl TickerCodec {
    /// Create a new codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a REST 24h ticker response body.
    ///
    /// # Errors
    ///
    /// Returns [`MarketDataError::DataFormat`] if the body is not an array
    /// of ticker rows.
    pub fn decode_snapshot(&self, body: &str) -> Result<Vec<RestTicker>, MarketDataError> {
        serde_json::from_str(body).map_err(|e| MarketDataError::DataFormat(e.to_string()))
    }

    /// Decode one stream text frame into a symbol and its fields.
    ///
    /// # Errors
    ///
    /// Returns [`MarketDataError::DataFormat`] if the frame is not a ticker event.
    pub fn decode_tick(&self, text: &str) -> Result<(Symbol, TickerFields), MarketDataError> {
        let payload: StreamPayload = serde_json::from_str(text).map_err(|e| {
            let preview: String = text.chars().take(80).collect();
            MarketDataError::DataFormat(format!("{e}: {preview}"))
        })?;

        let ticker = payload.into_ticker();
        let fields = ticker.fields();
        Ok((ticker.symbol, fields))
    }
}

/// Keep rows quoted in `suffix`, sort by descending quote volume, take the
/// first `count`, and assign 1-based ranks.
///
/// Rows with equal quote volume keep their response order.
#[must_use]
pub fn rank_by_quote_volume(rows: Vec<RestTicker>, suffix: &str, count: usize) -> Vec<TickerSnapshot> {
    let mut quoted: Vec<RestTicker> = rows
        .into_iter()
        .filter(|row| row.symbol.ends_with(suffix))
        .collect();

    quoted.sort_by(|a, b| b.quote_volume.cmp(&a.quote_volume));

    quoted
        .into_iter()
        .take(count)
        .zip(1_u32..)
        .map(|(row, rank)| {
            let name = base_name(&row.symbol, suffix);
            let fields = row.fields();
            TickerSnapshot::new(row.symbol, name, rank, fields)
        })
        .collect()
}

/// All rows quoted in `suffix` as summaries, by descending quote volume.
#[must_use]
pub fn quote_pairs(rows: Vec<RestTicker>, suffix: &str) -> Vec<PairSummary> {
    let mut pairs: Vec<PairSummary> = rows
        .into_iter()
        .filter(|row| row.symbol.ends_with(suffix))
        .map(|row| PairSummary {
            name: base_name(&row.symbol, suffix),
            symbol: row.symbol,
            last_price: row.last_price,
            price_change_percent: row.price_change_percent,
            quote_volume: row.quote_volume,
        })
        .collect();

    pairs.sort_by(|a, b| b.quote_volume.cmp(&a.quote_volume));
    pairs
}
