/// hourglass library
///
/// Projects with target durations, sessions logged against them, and the
/// JSON stores that hold both.

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod store;

// Re-exports for convenience
pub use config::Config;
pub use self::core::Tracker;
pub use error::{Result, TrackerError};
pub use store::RecordStore;
