//! Ticker Stream Binary
//!
//! Starts the live crypto ticker dashboard.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin ticker-stream
//! ```
//!
//! # Environment Variables
//!
//! All optional.
//! - `TICKER_REST_BASE_URL`: REST API base (default: <https://api.binance.com/api/v3>)
//! - `TICKER_WS_BASE_URL`: WebSocket base (default: <wss://stream.binance.com:9443/ws>)
//! - `TICKER_QUOTE_SUFFIX`: Quote asset filter (default: USDT)
//! - `TICKER_HTTP_PORT`: Dashboard HTTP port (default: 8083)
//! - `TICKER_PREFERENCES_PATH`: Preferences file (default: ticker-preferences.json)
//! - `TICKER_RECONNECT_DELAY_MS`, `TICKER_MAX_RECONNECT_ATTEMPTS`,
//!   `TICKER_REFRESH_INTERVAL_SECS`: Stream timing
//! - `OTEL_ENABLED`: Export traces over OTLP (default: false)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use ticker_stream::infrastructure::telemetry;
use ticker_stream::{
    Dashboard, HttpServer, HttpState, LogSink, MarketDataClient, MarketDataClientConfig,
    PreferenceStore, TickerConfig, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed");
    }

    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting Ticker Stream");

    if let Err(e) = init_metrics() {
        tracing::warn!(error = %e, "Prometheus recorder not installed");
    }

    let config = TickerConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let preferences = Arc::new(PreferenceStore::open(&config.preferences.path));
    let prefs = preferences.get();

    let client = Arc::new(MarketDataClient::new(MarketDataClientConfig::from_config(
        &config,
    ))?);
    let sink = Arc::new(LogSink::new());

    let dashboard = Arc::new(Dashboard::new(
        Arc::clone(&client) as _,
        Arc::clone(&client) as _,
        Arc::clone(&sink) as _,
    ));

    let http_state = Arc::new(HttpState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&dashboard),
        Arc::clone(&preferences),
        Arc::clone(&sink),
        client,
    ));
    let http_server = HttpServer::new(config.server.http_port, http_state, shutdown_token.clone());
    let http_handle = tokio::spawn(async move {
        if let Err(e) = http_server.run().await {
            tracing::error!(error = %e, "HTTP server error");
        }
    });

    // A failed first load stays failed until the count is changed.
    match dashboard.start(prefs.crypto_count).await {
        Ok(outcome) => tracing::info!(?outcome, "Dashboard ready"),
        Err(e) => tracing::error!(error = %e, "Initial snapshot failed"),
    }

    await_shutdown(shutdown_token).await;

    dashboard.shutdown();
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, http_handle).await.is_err() {
        tracing::warn!("HTTP server did not stop in time");
    }

    tracing::info!("Ticker Stream stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &TickerConfig) {
    tracing::info!(
        quote_suffix = %config.rest.quote_suffix,
        http_port = config.server.http_port,
        preferences = %config.preferences.path.display(),
        "Configuration loaded"
    );
    tracing::debug!(
        rest_base_url = %config.rest.base_url,
        ws_base_url = %config.stream.base_url,
        reconnect_delay_ms = config.stream.reconnect_delay_initial.as_millis(),
        max_reconnect_attempts = config.stream.max_reconnect_attempts,
        refresh_interval_secs = config.stream.refresh_interval.as_secs(),
        "Market data endpoints"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
