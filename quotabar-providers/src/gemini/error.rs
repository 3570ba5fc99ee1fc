//! Gemini-specific errors.

use std::path::PathBuf;

use quotabar_fetch::ProcessError;
use thiserror::Error;

/// Errors from the local probes used by the Gemini provider.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Subprocess and system path probing is disabled.
    #[error("Host probing disabled")]
    ProbeDisabled,

    /// A companion command failed.
    #[error("Command failed: {0}")]
    Process(#[from] ProcessError),

    /// A companion command printed nothing.
    #[error("{0} printed nothing")]
    EmptyOutput(&'static str),

    /// The OAuth client file could not be read.
    #[error("Cannot read {path}: {source}")]
    Unreadable {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The OAuth client file has no client id or secret.
    #[error("No OAuth client in {0}")]
    MissingClient(PathBuf),
}
