//! Store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Atomic write failed.
    #[error(transparent)]
    Fetch(#[from] quotabar_fetch::FetchError),

    /// Configuration file could not be used.
    #[error("Invalid configuration in {path}: {reason}")]
    Config {
        /// Config file.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },
}
