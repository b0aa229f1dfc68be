//! Domain Layer - Core ticker types and state.
//!
//! Pure types with no I/O: ticker rows, the price store, subscription
//! bookkeeping, and display preferences.

/// Ticker rows and numeric fields.
pub mod ticker;

/// In-memory price state keyed by symbol.
pub mod store;

/// Subscription sets, connection state, and termination reasons.
pub mod subscription;

/// Display preferences and ordering.
pub mod preferences;
