//! Configuration Module
//!
//! Environment-driven configuration for the ticker service.

mod settings;

pub use settings::{
    ConfigError, PreferenceSettings, RestSettings, ServerSettings, StreamSettings, TickerConfig,
};
