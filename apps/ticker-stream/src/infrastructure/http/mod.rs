//! Dashboard HTTP Surface
//!
//! Health, metrics and dashboard endpoints.
//!
//! # Endpoints
//!
//! - `GET /health` - JSON health status
//! - `GET /healthz` - liveness check (simple OK)
//! - `GET /readyz` - readiness check (ready while the stream is connected)
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /tickers` - arranged ticker rows with favorite flags
//! - `GET /pairs` - every quoted pair by quote volume
//! - `GET /preferences` - current preferences
//! - `PUT /preferences` - change theme, chart flag or sort option
//! - `POST /preferences/reset` - restore defaults and rebuild
//! - `PUT /preferences/count` - set the pair count and rebuild
//! - `POST /favorites/{symbol}` - toggle a favorite

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{MarketDataError, SnapshotProvider};
use crate::application::services::{Dashboard, RebuildOutcome};
use crate::domain::preferences::{DEFAULT_CRYPTO_COUNT, Preferences, SortBy, THEMES, arrange};
use crate::domain::subscription::ConnectionState;
use crate::domain::ticker::{PairSummary, Symbol, TickerSnapshot};
use crate::infrastructure::metrics::get_metrics_handle;
use crate::infrastructure::preferences::{PreferenceError, PreferenceStore};
use crate::infrastructure::presentation::{LogSink, StatusReport};

// =============================================================================
// Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Service version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Latest stream status.
    pub connection: StatusReport,
    /// Symbols in the price store.
    pub symbols: usize,
    /// Last store change.
    pub last_updated: Option<DateTime<Utc>>,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Streaming live data.
    Healthy,
    /// Starting up or reconnecting.
    Degraded,
    /// Failed or closed.
    Unhealthy,
}

impl HealthStatus {
    /// Map a connection state to a health status.
    #[must_use]
    pub const fn from_connection(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Connected => Self::Healthy,
            ConnectionState::Idle | ConnectionState::Connecting | ConnectionState::Reconnecting => {
                Self::Degraded
            }
            ConnectionState::Failed | ConnectionState::Closed => Self::Unhealthy,
        }
    }
}

/// One displayed ticker row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerRow {
    /// Ticker data.
    #[serde(flatten)]
    pub ticker: TickerSnapshot,
    /// Whether the symbol is a favorite.
    pub favorite: bool,
    /// Whether the 24h change is non-negative.
    pub is_up: bool,
}

/// `GET /tickers` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickersResponse {
    /// Active sort option.
    pub sort_by: SortBy,
    /// Last store change.
    pub last_updated: Option<DateTime<Utc>>,
    /// Rows, favorites first.
    pub tickers: Vec<TickerRow>,
}

/// `GET /preferences` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesResponse {
    /// Display settings.
    #[serde(flatten)]
    pub settings: Preferences,
    /// Favorite symbols.
    pub favorites: Vec<Symbol>,
}

/// `PUT /preferences` request. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    /// Theme name.
    pub theme: Option<String>,
    /// Chart flag.
    pub show_charts: Option<bool>,
    /// Sort option.
    pub sort_by: Option<SortBy>,
}

/// `POST /preferences/reset` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    /// Preferences after the reset.
    pub preferences: PreferencesResponse,
    /// Whether the rebuild was applied.
    pub applied: bool,
    /// Streamed symbols after the rebuild.
    pub symbols: usize,
}

/// `PUT /preferences/count` request.
#[derive(Debug, Clone, Deserialize)]
pub struct CountRequest {
    /// Requested pair count (clamped to the supported range).
    pub count: usize,
}

/// `PUT /preferences/count` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    /// Stored pair count.
    pub count: usize,
    /// Whether the rebuild was applied.
    pub applied: bool,
    /// Streamed symbols after the rebuild.
    pub symbols: usize,
}

/// `POST /favorites/{symbol}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteResponse {
    /// Symbol toggled.
    pub symbol: Symbol,
    /// Whether it is now a favorite.
    pub favorite: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

// =============================================================================
// Errors
// =============================================================================

enum ApiError {
    BadRequest(String),
    Preferences(PreferenceError),
    MarketData(MarketDataError),
}

impl From<PreferenceError> for ApiError {
    fn from(e: PreferenceError) -> Self {
        Self::Preferences(e)
    }
}

impl From<MarketDataError> for ApiError {
    fn from(e: MarketDataError) -> Self {
        Self::MarketData(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Preferences(e) => {
                tracing::error!(error = %e, "Preference write failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            Self::MarketData(e) => {
                tracing::warn!(error = %e, kind = e.kind(), "Market data request failed");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Server State
// =============================================================================

/// Shared state for the HTTP handlers.
pub struct HttpState {
    version: String,
    started_at: Instant,
    dashboard: Arc<Dashboard>,
    preferences: Arc<PreferenceStore>,
    sink: Arc<LogSink>,
    snapshots: Arc<dyn SnapshotProvider>,
}

impl HttpState {
    /// Create new server state.
    #[must_use]
    pub fn new(
        version: String,
        dashboard: Arc<Dashboard>,
        preferences: Arc<PreferenceStore>,
        sink: Arc<LogSink>,
        snapshots: Arc<dyn SnapshotProvider>,
    ) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            dashboard,
            preferences,
            sink,
            snapshots,
        }
    }
}

/// Build the router with all endpoints.
pub fn create_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .route("/tickers", get(tickers_handler))
        .route("/pairs", get(pairs_handler))
        .route(
            "/preferences",
            get(preferences_handler).put(update_preferences_handler),
        )
        .route("/preferences/reset", post(reset_handler))
        .route("/preferences/count", put(count_handler))
        .route("/favorites/{symbol}", post(favorite_handler))
        .with_state(state)
}

// =============================================================================
// HTTP Server
// =============================================================================

/// Dashboard HTTP server.
pub struct HttpServer {
    port: u16,
    state: Arc<HttpState>,
    cancel: CancellationToken,
}

impl HttpServer {
    /// Create a new server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<HttpState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HttpServerError` if binding fails or the server fails while
    /// running.
    pub async fn run(self) -> Result<(), HttpServerError> {
        let app = create_router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HttpServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HttpServerError::ServerFailed(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let connection = state.sink.status();
    let status = HealthStatus::from_connection(connection.state);
    let (symbols, last_updated) = {
        let store = state.dashboard.store();
        let store = store.read();
        (store.len(), store.last_updated())
    };

    let response = HealthResponse {
        status,
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        connection,
        symbols,
        last_updated,
    };

    let status_code = match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    if state.sink.status().state.is_live() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}

async fn tickers_handler(State(state): State<Arc<HttpState>>) -> Json<TickersResponse> {
    let prefs = state.preferences.get();
    let (tickers, last_updated) = {
        let store = state.dashboard.store();
        let store = store.read();
        (store.get_all(), store.last_updated())
    };

    let rows = arrange(&tickers, &prefs)
        .into_iter()
        .map(|ticker| TickerRow {
            favorite: prefs.is_favorite(&ticker.symbol),
            is_up: ticker.is_up(),
            ticker,
        })
        .collect();

    Json(TickersResponse {
        sort_by: prefs.sort_by,
        last_updated,
        tickers: rows,
    })
}

async fn pairs_handler(
    State(state): State<Arc<HttpState>>,
) -> Result<Json<Vec<PairSummary>>, ApiError> {
    Ok(Json(state.snapshots.fetch_quote_pairs().await?))
}

impl From<Preferences> for PreferencesResponse {
    fn from(prefs: Preferences) -> Self {
        Self {
            favorites: prefs.favorites.clone(),
            settings: prefs,
        }
    }
}

async fn preferences_handler(State(state): State<Arc<HttpState>>) -> Json<PreferencesResponse> {
    Json(state.preferences.get().into())
}

async fn update_preferences_handler(
    State(state): State<Arc<HttpState>>,
    Json(update): Json<PreferencesUpdate>,
) -> Result<Json<PreferencesResponse>, ApiError> {
    if let Some(theme) = update.theme.as_deref()
        && !THEMES.contains(&theme)
    {
        return Err(ApiError::BadRequest(format!("unknown theme: {theme}")));
    }

    let prefs = state.preferences.update(|prefs| {
        if let Some(theme) = update.theme.as_deref() {
            prefs.set_theme(theme);
        }
        if let Some(show_charts) = update.show_charts {
            prefs.show_charts = show_charts;
        }
        if let Some(sort_by) = update.sort_by {
            prefs.sort_by = sort_by;
        }
        prefs.clone()
    })?;
    tracing::info!(theme = %prefs.theme, sort_by = ?prefs.sort_by, show_charts = prefs.show_charts, "Preferences updated");

    Ok(Json(prefs.into()))
}

async fn reset_handler(
    State(state): State<Arc<HttpState>>,
) -> Result<Json<ResetResponse>, ApiError> {
    state.preferences.reset()?;
    tracing::info!("Preferences reset to defaults");
    let outcome = state.dashboard.update_count(DEFAULT_CRYPTO_COUNT).await?;

    let (applied, symbols) = match outcome {
        RebuildOutcome::Applied { symbols } => (true, symbols),
        RebuildOutcome::Superseded => (false, 0),
    };
    Ok(Json(ResetResponse {
        preferences: state.preferences.get().into(),
        applied,
        symbols,
    }))
}

async fn count_handler(
    State(state): State<Arc<HttpState>>,
    Json(request): Json<CountRequest>,
) -> Result<Json<CountResponse>, ApiError> {
    let count = state.preferences.set_count(request.count)?;
    let outcome = state.dashboard.update_count(count).await?;

    let (applied, symbols) = match outcome {
        RebuildOutcome::Applied { symbols } => (true, symbols),
        RebuildOutcome::Superseded => (false, 0),
    };
    Ok(Json(CountResponse {
        count,
        applied,
        symbols,
    }))
}

async fn favorite_handler(
    State(state): State<Arc<HttpState>>,
    Path(symbol): Path<String>,
) -> Result<Json<FavoriteResponse>, ApiError> {
    let symbol = symbol.to_uppercase();
    let favorite = state.preferences.toggle_favorite(&symbol)?;
    tracing::info!(%symbol, favorite, "Favorite toggled");

    Ok(Json(FavoriteResponse { symbol, favorite }))
}

// =============================================================================
// Tests
// =============================================================================
