//! Core error types for `quotabar`.

use thiserror::Error;

/// Core error type for `quotabar` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Provider name did not match any supported provider.
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// Invalid data from API response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
