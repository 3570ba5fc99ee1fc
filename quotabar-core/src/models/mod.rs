//! Domain models for quotabar.
//!
//! ## Submodules
//!
//! - [`provider`] - Provider types (ProviderKind, ProviderMetadata)
//! - [`credential`] - Resolved credential material
//! - [`reset`] - Reset timestamp parsing and [`ResetEta`]
//! - [`usage`] - Usage types (UsageSnapshot, UsageWindow, Failure)
//! - [`report`] - The aggregated [`UsageReport`]

mod credential;
mod provider;
mod report;
mod reset;
mod usage;

// Re-export everything at the models level
pub use credential::{Credential, CredentialKind};
pub use provider::{ProviderKind, ProviderMetadata};
pub use report::UsageReport;
pub use reset::{
    ResetEta, parse_reset_timestamp, reset_from_epoch_millis, reset_from_relative_seconds,
};
pub use usage::{
    ActivitySummary, Balance, Failure, FailureKind, QuotaCounter, SnapshotStatus, UsageSnapshot,
    UsageWindow,
};
