//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer.

/// Configuration loading.
pub mod config;

/// Dashboard HTTP surface, health and metrics endpoints.
pub mod http;

/// REST and WebSocket market data client.
pub mod market_data;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// File-backed user preferences.
pub mod preferences;

/// Log-based presentation sink.
pub mod presentation;

/// Logging and OpenTelemetry tracing setup.
pub mod telemetry;
