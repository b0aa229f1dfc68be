//! Preference Persistence
//!
//! Stores [`Preferences`] in a local JSON key-value file. Each value lives
//! under a fixed key and is decoded on its own, so one corrupt entry does not
//! discard the others:
//!
//! ```json
//! {
//!   "crypto-tracker-settings": {"theme": "dark", "cryptoCount": 10, "showCharts": true, "sortBy": "rank"},
//!   "crypto-tracker-favorites": ["BTCUSDT", "ETHUSDT"]
//! }
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::domain::preferences::Preferences;
use crate::domain::ticker::Symbol;

/// Key holding theme, count, chart flag and sort option.
pub const SETTINGS_KEY: &str = "crypto-tracker-settings";

/// Key holding the favorites list.
pub const FAVORITES_KEY: &str = "crypto-tracker-favorites";

/// Preference persistence error.
#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    /// Reading or writing the file failed.
    #[error("preferences file {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Encoding failed.
    #[error("failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

/// File-backed preferences with an in-memory copy.
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    current: RwLock<Preferences>,
}

impl PreferenceStore {
    /// Open the store at `path`, loading whatever it already holds.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = Self::load(&path);
        Self {
            path,
            current: RwLock::new(current),
        }
    }

    /// Read preferences from `path`.
    ///
    /// A missing file yields defaults. Unreadable or corrupt content is
    /// logged and replaced by defaults, per key.
    #[must_use]
    pub fn load(path: &Path) -> Preferences {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No preferences file, using defaults");
                return Preferences::default();
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read preferences, using defaults");
                return Preferences::default();
            }
        };

        let entries: Map<String, Value> = match serde_json::from_str(&text) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt preferences file, using defaults");
                return Preferences::default();
            }
        };

        let mut prefs: Preferences = read_key(&entries, SETTINGS_KEY).unwrap_or_default();
        prefs.crypto_count = Preferences::clamp_count(prefs.crypto_count);

        let favorites: Vec<Symbol> = read_key(&entries, FAVORITES_KEY).unwrap_or_default();
        for symbol in favorites {
            if !prefs.is_favorite(&symbol) {
                prefs.favorites.push(symbol);
            }
        }

        prefs
    }

    /// File path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current preferences.
    #[must_use]
    pub fn get(&self) -> Preferences {
        self.current.read().clone()
    }

    /// Write the current preferences to disk.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError`] if the file cannot be written.
    pub fn save(&self) -> Result<(), PreferenceError> {
        let prefs = self.current.read().clone();
        self.write(&prefs)
    }

    /// Apply `change` and persist the result.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError`] if the file cannot be written. The
    /// in-memory copy keeps the change either way.
    pub fn update<R>(&self, change: impl FnOnce(&mut Preferences) -> R) -> Result<R, PreferenceError> {
        let (result, snapshot) = {
            let mut prefs = self.current.write();
            let result = change(&mut prefs);
            (result, prefs.clone())
        };
        self.write(&snapshot)?;
        Ok(result)
    }

    /// Clamp and store a new crypto count. Returns the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError`] if the file cannot be written.
    pub fn set_count(&self, count: usize) -> Result<usize, PreferenceError> {
        self.update(|prefs| {
            prefs.crypto_count = Preferences::clamp_count(count);
            prefs.crypto_count
        })
    }

    /// Toggle `symbol` in the favorites list. Returns `true` if it is now a favorite.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError`] if the file cannot be written.
    pub fn toggle_favorite(&self, symbol: &str) -> Result<bool, PreferenceError> {
        self.update(|prefs| prefs.toggle_favorite(symbol))
    }

    /// Restore defaults and clear favorites.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError`] if the file cannot be written.
    pub fn reset(&self) -> Result<(), PreferenceError> {
        self.update(|prefs| *prefs = Preferences::default())
    }

    fn write(&self, prefs: &Preferences) -> Result<(), PreferenceError> {
        let mut entries = Map::new();
        entries.insert(SETTINGS_KEY.to_string(), serde_json::to_value(prefs)?);
        entries.insert(FAVORITES_KEY.to_string(), serde_json::to_value(&prefs.favorites)?);

        let text = serde_json::to_string_pretty(&Value::Object(entries))?;
        std::fs::write(&self.path, text).map_err(|source| PreferenceError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

fn read_key<T: DeserializeOwned>(entries: &Map<String, Value>, key: &str) -> Option<T> {
    let value = entries.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring corrupt preference entry");
            None
        }
    }
}
