//! Price State Store
//!
//! In-memory mapping from symbol to the last-known [`TickerSnapshot`].
//!
//! # Mutation Paths
//!
//! - [`PriceStore::seed`] replaces the whole content with a fresh snapshot.
//! - [`PriceStore::apply_tick`] overwrites the numeric fields of one row.
//!
//! Reads expose the insertion order of the last seed; the store never
//! re-sorts by itself.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::ticker::{Symbol, TickerFields, TickerSnapshot};

/// Store shared between the orchestrator and the stream observer.
pub type SharedPriceStore = Arc<RwLock<PriceStore>>;

/// Last-known ticker rows, keyed by symbol, in seed order.
#[derive(Debug, Default, Clone)]
pub struct PriceStore {
    rows: Vec<TickerSnapshot>,
    index: HashMap<Symbol, usize>,
    last_updated: Option<DateTime<Utc>>,
}

impl PriceStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store wrapped for sharing.
    #[must_use]
    pub fn shared() -> SharedPriceStore {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Replace the entire content with `snapshots`, keeping their order.
    ///
    /// If a symbol appears more than once, the first occurrence wins and the
    /// rest are discarded.
    pub fn seed(&mut self, snapshots: impl IntoIterator<Item = TickerSnapshot>) {
        self.rows.clear();
        self.index.clear();

        for snapshot in snapshots {
            if self.index.contains_key(&snapshot.symbol) {
                tracing::warn!(symbol = %snapshot.symbol, "Duplicate symbol in snapshot, ignoring");
                continue;
            }
            self.index.insert(snapshot.symbol.clone(), self.rows.len());
            self.rows.push(snapshot);
        }

        self.last_updated = Some(Utc::now());
    }

    /// Overwrite the numeric fields of `symbol`.
    ///
    /// Returns `false` and leaves the store untouched when the symbol is not
    /// present. A late tick for a symbol dropped by a rebuild ends up here.
    pub fn apply_tick(&mut self, symbol: &str, fields: TickerFields) -> bool {
        let Some(&position) = self.index.get(symbol) else {
            return false;
        };

        self.rows[position].fields = fields;
        self.last_updated = Some(Utc::now());
        true
    }

    /// All rows in seed order.
    #[must_use]
    pub fn get_all(&self) -> Vec<TickerSnapshot> {
        self.rows.clone()
    }

    /// Look up a single row.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&TickerSnapshot> {
        self.index.get(symbol).map(|&position| &self.rows[position])
    }

    /// Symbols in seed order.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        self.rows.iter().map(|row| row.symbol.clone()).collect()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the store holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Time of the last seed or applied tick.
    #[must_use]
    pub const fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }
}
