//! Service Configuration Settings
//!
//! Configuration types for the ticker service, loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::infrastructure::market_data::{
    DEFAULT_QUOTE_SUFFIX, DEFAULT_REST_BASE_URL, DEFAULT_WS_BASE_URL,
};

/// REST snapshot settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestSettings {
    /// REST API base URL.
    pub base_url: String,
    /// Quote asset suffix used to filter pairs.
    pub quote_suffix: String,
    /// Request timeout.
    pub http_timeout: Duration,
}

impl Default for RestSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REST_BASE_URL.to_string(),
            quote_suffix: DEFAULT_QUOTE_SUFFIX.to_string(),
            http_timeout: Duration::from_secs(10),
        }
    }
}

/// WebSocket stream settings.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSettings {
    /// WebSocket base URL.
    pub base_url: String,
    /// Initial reconnection delay.
    pub reconnect_delay_initial: Duration,
    /// Maximum reconnection delay.
    pub reconnect_delay_max: Duration,
    /// Reconnection delay multiplier (1.0 = fixed delay).
    pub reconnect_delay_multiplier: f64,
    /// Reconnection jitter as a fraction of the delay.
    pub reconnect_jitter: f64,
    /// Maximum reconnection attempts before giving up (0 = unlimited).
    pub max_reconnect_attempts: u32,
    /// Proactive reconnect interval for long-lived connections.
    pub refresh_interval: Duration,
    /// Idle timeout (`None` = disabled).
    pub idle_timeout: Option<Duration>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WS_BASE_URL.to_string(),
            reconnect_delay_initial: Duration::from_millis(5000),
            reconnect_delay_max: Duration::from_secs(5),
            reconnect_delay_multiplier: 1.0,
            reconnect_jitter: 0.0,
            max_reconnect_attempts: 0, // Unlimited
            refresh_interval: Duration::from_secs(82_800),
            idle_timeout: None,
        }
    }
}

impl StreamSettings {
    /// Check the reconnect and refresh timing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the jitter is outside
    /// `0.0..=1.0`, the multiplier is below 1.0, either is not finite, or the
    /// refresh interval is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let jitter = self.reconnect_jitter;
        if !jitter.is_finite() || !(0.0..=1.0).contains(&jitter) {
            return Err(ConfigError::InvalidValue {
                key: "TICKER_RECONNECT_JITTER".to_string(),
                reason: format!("{jitter} is not a fraction between 0 and 1"),
            });
        }

        let multiplier = self.reconnect_delay_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                key: "TICKER_RECONNECT_MULTIPLIER".to_string(),
                reason: format!("{multiplier} must be a finite value of at least 1.0"),
            });
        }

        if self.refresh_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "TICKER_REFRESH_INTERVAL_SECS".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Dashboard HTTP port.
    pub http_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { http_port: 8083 }
    }
}

/// Preference persistence settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceSettings {
    /// Preferences file path.
    pub path: PathBuf,
}

impl Default for PreferenceSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("ticker-preferences.json"),
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickerConfig {
    /// REST snapshot settings.
    pub rest: RestSettings,
    /// Stream settings.
    pub stream: StreamSettings,
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Preference persistence settings.
    pub preferences: PreferenceSettings,
}

impl TickerConfig {
    /// Create configuration from environment variables.
    ///
    /// Unset or unparsable values fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyValue`] if a URL or the quote suffix is set
    /// to an empty string.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let rest_defaults = RestSettings::default();
        let stream_defaults = StreamSettings::default();

        let rest = RestSettings {
            base_url: env.non_empty("TICKER_REST_BASE_URL", &rest_defaults.base_url)?,
            quote_suffix: env.non_empty("TICKER_QUOTE_SUFFIX", &rest_defaults.quote_suffix)?,
            http_timeout: env
                .duration_secs("TICKER_HTTP_TIMEOUT_SECS", rest_defaults.http_timeout),
        };

        let idle_secs = env.parse("TICKER_IDLE_TIMEOUT_SECS", 0_u64);

        let stream = StreamSettings {
            base_url: env.non_empty("TICKER_WS_BASE_URL", &stream_defaults.base_url)?,
            reconnect_delay_initial: env.duration_millis(
                "TICKER_RECONNECT_DELAY_MS",
                stream_defaults.reconnect_delay_initial,
            ),
            reconnect_delay_max: env.duration_secs(
                "TICKER_RECONNECT_DELAY_MAX_SECS",
                stream_defaults.reconnect_delay_max,
            ),
            reconnect_delay_multiplier: env.parse(
                "TICKER_RECONNECT_MULTIPLIER",
                stream_defaults.reconnect_delay_multiplier,
            ),
            reconnect_jitter: env.parse("TICKER_RECONNECT_JITTER", stream_defaults.reconnect_jitter),
            max_reconnect_attempts: env.parse(
                "TICKER_MAX_RECONNECT_ATTEMPTS",
                stream_defaults.max_reconnect_attempts,
            ),
            refresh_interval: env.duration_secs(
                "TICKER_REFRESH_INTERVAL_SECS",
                stream_defaults.refresh_interval,
            ),
            idle_timeout: (idle_secs > 0).then(|| Duration::from_secs(idle_secs)),
        };
        stream.validate()?;
        let stream = StreamSettings {
            reconnect_delay_max: stream.reconnect_delay_max.max(stream.reconnect_delay_initial),
            ..stream
        };

        let server = ServerSettings {
            http_port: env.parse("TICKER_HTTP_PORT", ServerSettings::default().http_port),
        };

        let preferences = PreferenceSettings {
            path: env
                .get("TICKER_PREFERENCES_PATH")
                .filter(|v| !v.is_empty())
                .map_or_else(|| PreferenceSettings::default().path, PathBuf::from),
        };

        Ok(Self {
            rest,
            stream,
            server,
            preferences,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),

    /// Environment variable parsed but is out of range.
    #[error("environment variable {key} is invalid: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// What is wrong with it.
        reason: String,
    },
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn non_empty(&self, key: &str, default: &str) -> Result<String, ConfigError> {
        match self.get(key) {
            Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyValue(key.to_string())),
            Some(value) => Ok(value.trim().to_string()),
            None => Ok(default.to_string()),
        }
    }

    fn parse<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn duration_secs(&self, key: &str, default: Duration) -> Duration {
        self.get(key)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(default, Duration::from_secs)
    }

    fn duration_millis(&self, key: &str, default: Duration) -> Duration {
        self.get(key)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(default, Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use test_case::test_case;

    fn load(vars: &[(&str, &str)]) -> Result<TickerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        TickerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config, TickerConfig::default());
        assert_eq!(config.rest.base_url, "https://api.binance.com/api/v3");
        assert_eq!(config.stream.base_url, "wss://stream.binance.com:9443/ws");
        assert_eq!(config.rest.quote_suffix, "USDT");
        assert_eq!(config.stream.reconnect_delay_initial, Duration::from_secs(5));
        assert_eq!(config.stream.refresh_interval, Duration::from_secs(23 * 3600));
        assert_eq!(config.stream.idle_timeout, None);
        assert_eq!(config.server.http_port, 8083);
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("TICKER_REST_BASE_URL", "http://localhost:9000"),
            ("TICKER_RECONNECT_DELAY_MS", "250"),
            ("TICKER_RECONNECT_MULTIPLIER", "2.0"),
            ("TICKER_MAX_RECONNECT_ATTEMPTS", "7"),
            ("TICKER_IDLE_TIMEOUT_SECS", "90"),
            ("TICKER_HTTP_PORT", "9999"),
            ("TICKER_PREFERENCES_PATH", "/tmp/prefs.json"),
        ])
        .unwrap();

        assert_eq!(config.rest.base_url, "http://localhost:9000");
        assert_eq!(config.stream.reconnect_delay_initial, Duration::from_millis(250));
        assert!((config.stream.reconnect_delay_multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.stream.max_reconnect_attempts, 7);
        assert_eq!(config.stream.idle_timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.server.http_port, 9999);
        assert_eq!(config.preferences.path, PathBuf::from("/tmp/prefs.json"));
    }

    #[test]
    fn unparsable_values_fall_back() {
        let config = load(&[
            ("TICKER_HTTP_PORT", "not-a-port"),
            ("TICKER_REFRESH_INTERVAL_SECS", "-1"),
        ])
        .unwrap();
        assert_eq!(config.server.http_port, 8083);
        assert_eq!(config.stream.refresh_interval, Duration::from_secs(82_800));
    }

    #[test]
    fn empty_url_is_rejected() {
        let err = load(&[("TICKER_WS_BASE_URL", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue(key) if key == "TICKER_WS_BASE_URL"));
    }

    #[test_case("TICKER_RECONNECT_JITTER", "NaN" ; "jitter nan")]
    #[test_case("TICKER_RECONNECT_JITTER", "inf" ; "jitter infinite")]
    #[test_case("TICKER_RECONNECT_JITTER", "-0.1" ; "jitter negative")]
    #[test_case("TICKER_RECONNECT_JITTER", "1.5" ; "jitter above one")]
    #[test_case("TICKER_RECONNECT_MULTIPLIER", "NaN" ; "multiplier nan")]
    #[test_case("TICKER_RECONNECT_MULTIPLIER", "inf" ; "multiplier infinite")]
    #[test_case("TICKER_RECONNECT_MULTIPLIER", "-2" ; "multiplier negative")]
    #[test_case("TICKER_RECONNECT_MULTIPLIER", "0" ; "multiplier zero")]
    #[test_case("TICKER_RECONNECT_MULTIPLIER", "0.5" ; "multiplier shrinking")]
    #[test_case("TICKER_REFRESH_INTERVAL_SECS", "0" ; "refresh zero")]
    fn invalid_stream_timing_is_rejected(key: &str, value: &str) {
        let err = load(&[(key, value)]).unwrap_err();
        assert!(
            matches!(&err, ConfigError::InvalidValue { key: k, .. } if k == key),
            "{key}={value} gave {err}"
        );
    }

    #[test_case("0" ; "no jitter")]
    #[test_case("0.25" ; "quarter")]
    #[test_case("1" ; "full")]
    fn jitter_fractions_are_accepted(value: &str) {
        let config = load(&[("TICKER_RECONNECT_JITTER", value)]).unwrap();
        assert!((0.0..=1.0).contains(&config.stream.reconnect_jitter));
    }

    #[test]
    fn max_delay_is_raised_to_initial_delay() {
        let config = load(&[("TICKER_RECONNECT_DELAY_MS", "10000")]).unwrap();
        assert_eq!(config.stream.reconnect_delay_initial, Duration::from_secs(10));
        assert_eq!(config.stream.reconnect_delay_max, Duration::from_secs(10));
    }
}
