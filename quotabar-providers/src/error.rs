//! Provider errors.
//!
//! These stay inside the crate: a fetcher logs them and leaves the affected
//! fields out of the snapshot.

use thiserror::Error;

/// Errors raised while interpreting provider payloads.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A payload did not have the expected shape.
    #[error("Unexpected {endpoint} payload at '{pointer}': {source}")]
    UnexpectedShape {
        /// Endpoint the payload came from.
        endpoint: String,
        /// JSON pointer of the offending value; empty for the whole payload.
        pointer: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}
