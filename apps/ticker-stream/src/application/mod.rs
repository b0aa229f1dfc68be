//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the dashboard orchestrator and the port interfaces
//! that define how it interacts with external systems.

/// Port interfaces for market data, streaming and presentation.
pub mod ports;

/// Application services.
pub mod services;
