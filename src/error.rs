/// Error types for hourglass
///
/// This module defines all possible errors that can occur in the application.
/// Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Exit code for bad user input (negative durations, malformed dates)
pub const EXIT_VALIDATION: u8 = 2;

/// Exit code for everything else that went wrong
pub const EXIT_FAILURE: u8 = 1;

/// Main error type for hourglass operations
#[derive(Error, Debug)]
pub enum TrackerError {
    /// I/O errors (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A store file exists but does not hold valid records
    #[error("Corrupt data in {path}: {source}")]
    CorruptData {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization error while writing a store
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Durations and time done can't go below zero
    #[error("Invalid duration: {0}")]
    InvalidDuration(i64),

    /// Date is neither `today` nor `YYYY-MM-DD`
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Empty or otherwise unusable record name
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    /// Project id not present in the projects store
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// Could not take the store lock
    #[error("Lock error: {0}")]
    Lock(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for hourglass operations
pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
    /// Convert to the message shown on the terminal
    pub fn user_message(&self) -> String {
        match self {
            TrackerError::Io(e) => {
                format!("File system error. Check permissions. Details: {}", e)
            }
            TrackerError::CorruptData { path, source } => {
                format!(
                    "Error: {} is not valid data ({}). Fix or remove the file.",
                    path, source
                )
            }
            TrackerError::Serialization(e) => format!("Data format error: {}", e),
            TrackerError::InvalidDuration(_) => {
                "Error: Duration must be a positive integer.".to_string()
            }
            TrackerError::InvalidDate(_) => {
                "Error: Invalid date format. Use YYYY-MM-DD.".to_string()
            }
            TrackerError::InvalidName(_) => "Error: Name must not be empty.".to_string(),
            TrackerError::ProjectNotFound(id) => format!("Error: Project {} not found.", id),
            TrackerError::Lock(msg) => {
                format!("Could not lock the data file. Details: {}", msg)
            }
            TrackerError::Config(msg) => format!("Configuration issue: {}", msg),
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        if self.is_validation() {
            EXIT_VALIDATION
        } else {
            EXIT_FAILURE
        }
    }

    /// True for errors caused by bad user input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TrackerError::InvalidDuration(_)
                | TrackerError::InvalidDate(_)
                | TrackerError::InvalidName(_)
        )
    }
}
