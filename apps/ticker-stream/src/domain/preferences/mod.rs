//! Display Preferences
//!
//! User-adjustable display settings and the ordering they imply.
//! Persistence lives in `infrastructure::preferences`.

use serde::{Deserialize, Serialize};

use crate::domain::ticker::{Symbol, TickerSnapshot};

/// Smallest number of pairs the dashboard tracks.
pub const MIN_CRYPTO_COUNT: usize = 5;

/// Largest number of pairs the dashboard tracks.
pub const MAX_CRYPTO_COUNT: usize = 50;

/// Default number of pairs.
pub const DEFAULT_CRYPTO_COUNT: usize = 10;

/// Default theme name.
pub const DEFAULT_THEME: &str = "dark";

/// Theme names the dashboard knows about.
pub const THEMES: &[&str] = &["dark", "light", "midnight", "ocean", "sunset"];

/// Sort order for the ticker list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Snapshot rank, ascending.
    #[default]
    Rank,
    /// Last price, descending.
    Price,
    /// Quote volume, descending.
    Volume,
    /// 24h percentage change, descending.
    Change,
}

/// User display preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    /// Theme name.
    pub theme: String,
    /// Number of pairs to track.
    pub crypto_count: usize,
    /// Whether price charts are shown.
    pub show_charts: bool,
    /// List ordering.
    pub sort_by: SortBy,
    /// Favorite symbols, in the order they were added.
    #[serde(skip)]
    pub favorites: Vec<Symbol>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            crypto_count: DEFAULT_CRYPTO_COUNT,
            show_charts: true,
            sort_by: SortBy::Rank,
            favorites: Vec::new(),
        }
    }
}

impl Preferences {
    /// Clamp a requested count into the supported range.
    #[must_use]
    pub fn clamp_count(count: usize) -> usize {
        count.clamp(MIN_CRYPTO_COUNT, MAX_CRYPTO_COUNT)
    }

    /// Whether `symbol` is a favorite.
    #[must_use]
    pub fn is_favorite(&self, symbol: &str) -> bool {
        self.favorites.iter().any(|s| s == symbol)
    }

    /// Add `symbol` to favorites, or remove it if already present.
    ///
    /// Returns `true` if the symbol is a favorite afterwards.
    pub fn toggle_favorite(&mut self, symbol: &str) -> bool {
        if let Some(position) = self.favorites.iter().position(|s| s == symbol) {
            self.favorites.remove(position);
            false
        } else {
            self.favorites.push(symbol.to_string());
            true
        }
    }

    /// Use `theme` if it is a known theme name.
    ///
    /// Returns `false` and keeps the current theme otherwise.
    pub fn set_theme(&mut self, theme: &str) -> bool {
        if THEMES.contains(&theme) {
            self.theme = theme.to_string();
            true
        } else {
            false
        }
    }
}

/// Order tickers for display: favorites first, then by `prefs.sort_by`.
///
/// The sort is stable, so ties keep their store order.
#[must_use]
pub fn arrange(tickers: &[TickerSnapshot], prefs: &Preferences) -> Vec<TickerSnapshot> {
    let mut sorted = tickers.to_vec();

    sorted.sort_by(|a, b| {
        let favorite_order = prefs
            .is_favorite(&b.symbol)
            .cmp(&prefs.is_favorite(&a.symbol));

        favorite_order.then_with(|| match prefs.sort_by {
            SortBy::Rank => a.rank.cmp(&b.rank),
            SortBy::Price => b.fields.last_price.cmp(&a.fields.last_price),
            SortBy::Volume => b.fields.quote_volume.cmp(&a.fields.quote_volume),
            SortBy::Change => b
                .fields
                .price_change_percent
                .cmp(&a.fields.price_change_percent),
        })
    });

    sorted
}
