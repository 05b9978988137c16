/// Core functionality modules
///
/// Project/session bookkeeping on top of the record store, plus progress
/// reporting.

pub mod progress;
pub mod tracker;

pub use progress::Progress;
pub use tracker::{Listing, NewProject, NewSession, SessionAdded, Tracker};
