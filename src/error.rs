//! Error types for the filetrack library
//!
//! Only setup-time failures surface as errors. Per-file I/O problems during
//! live tracking are absorbed by the fingerprint calculator and recorded as
//! an unreadable state instead of being propagated.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the filetrack library
pub type Result<T> = std::result::Result<T, TrackError>;

/// Main error type for all filetrack operations
#[derive(Debug, Error)]
pub enum TrackError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Walk directory error from walkdir crate
    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// The OS-level notification source could not be set up
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// The target directory is missing or is not a directory
    #[error("Invalid root directory: {0:?}")]
    InvalidRoot(PathBuf),

    /// Pattern parsing error
    #[error("Invalid ignore pattern: {0}")]
    InvalidPattern(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Backup store errors
    #[error("Backup error: {0}")]
    Backup(String),

    /// Hash mismatch when reading back a backed-up object
    #[error("Hash mismatch - expected: {expected}, actual: {actual}")]
    HashMismatch {
        /// Expected hash value
        expected: String,
        /// Actual computed hash value
        actual: String,
    },

    /// Thread pool error
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrackError {
    /// Create a backup error with a custom message
    pub fn backup(msg: impl Into<String>) -> Self {
        TrackError::Backup(msg.into())
    }

    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        TrackError::Internal(msg.into())
    }

    /// Whether this error must stop the engine from starting
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TrackError::InvalidRoot(_)
                | TrackError::WalkDir(_)
                | TrackError::Watch(_)
                | TrackError::InvalidPattern(_)
                | TrackError::InvalidConfiguration(_)
                | TrackError::ThreadPool(_)
        )
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            TrackError::InvalidRoot(path) => {
                format!("Cannot watch {:?}: it does not exist or is not a directory.", path)
            }
            TrackError::Watch(e) => {
                format!(
                    "Failed to start watching: {}. Check that the directory is readable \
                     and that the OS watch limit has not been reached.",
                    e
                )
            }
            TrackError::InvalidPattern(pattern) => {
                format!("Ignore pattern '{}' is not a valid glob.", pattern)
            }
            _ => self.to_string(),
        }
    }
}
