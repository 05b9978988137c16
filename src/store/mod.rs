/// Record store for hourglass
///
/// Keyed JSON collections on disk, one file per entity kind.
/// Writes are locked and go through a temp file.

pub mod connection;
pub mod models;
pub mod queries;

pub use connection::{RecordStore, StoreLock};
pub use models::*;
pub use queries::{DeleteOutcome, DeleteReport, Fetched, PutOutcome};
