//! Application Services
//!
//! - [`Dashboard`]: snapshot, store, stream and sink orchestration

mod dashboard;

pub use dashboard::{Dashboard, RebuildOutcome};
