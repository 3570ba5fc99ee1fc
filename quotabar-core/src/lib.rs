// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # quotabar Core
//!
//! Core types and models for the `quotabar` usage checker.
//!
//! This crate provides the foundational abstractions used across all other
//! `quotabar` crates:
//!
//! - Domain models (providers, credentials, usage windows, reports)
//! - Reset-time normalization shared by every provider
//! - Error types
//!
//! ## Key Types
//!
//! ### Provider Types
//! - [`ProviderKind`] - Enum of all supported providers
//! - [`ProviderMetadata`] - Display names, hints and dashboard links
//!
//! ### Credential Types
//! - [`Credential`] - Resolved API key or OAuth material for one provider
//! - [`CredentialKind`] - API key vs. OAuth
//!
//! ### Usage Types
//! - [`UsageReport`] - Snapshot per provider, the unit that is cached and rendered
//! - [`UsageSnapshot`] - Normalized result of one provider fetch
//! - [`UsageWindow`] - Individual quota window (5h, 7d, per model, ...)
//! - [`ResetEta`] - Time until a window resets
//! - [`Failure`] / [`FailureKind`] - Why a fetch did not produce usage

pub mod error;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Provider types
    ProviderKind,
    ProviderMetadata,
    // Credential types
    Credential,
    CredentialKind,
    // Reset handling
    ResetEta,
    parse_reset_timestamp,
    reset_from_epoch_millis,
    reset_from_relative_seconds,
    // Usage types
    ActivitySummary,
    Balance,
    Failure,
    FailureKind,
    QuotaCounter,
    SnapshotStatus,
    UsageReport,
    UsageSnapshot,
    UsageWindow,
};
