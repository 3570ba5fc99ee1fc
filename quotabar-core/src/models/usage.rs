//! Usage-related types.
//!
//! This module contains the normalized shape every provider response is
//! mapped into:
//! - [`UsageSnapshot`] - Result of one provider fetch
//! - [`UsageWindow`] - Individual quota window
//! - [`Failure`] - Why a fetch produced no usage
//! - [`Balance`], [`QuotaCounter`], [`ActivitySummary`] - Provider extras

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::provider::{ProviderKind, ProviderMetadata};
use super::reset::ResetEta;
use crate::error::CoreError;

/// Rounds to one decimal place.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ============================================================================
// Usage Window
// ============================================================================

/// A single quota window (rolling 5h, 7d, a model bucket, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageWindow {
    /// Label the window is keyed by.
    pub label: String,
    /// Percentage of quota used (0-100).
    pub used_percent: f64,
    /// Percentage of quota left (0-100).
    pub remaining_percent: f64,
    /// Window duration in minutes (300 = 5 hours, 10080 = 1 week).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_minutes: Option<u32>,
    /// When this window resets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<DateTime<Utc>>,
    /// Time until reset, relative to when the snapshot was taken.
    #[serde(default)]
    pub reset_eta: ResetEta,
}

impl UsageWindow {
    /// Creates a window from a used percentage.
    pub fn from_used_percent(label: impl Into<String>, used_percent: f64) -> Self {
        let mut window = Self {
            label: label.into(),
            used_percent,
            remaining_percent: 0.0,
            window_minutes: None,
            resets_at: None,
            reset_eta: ResetEta::NotAvailable,
        };
        window.sanitize();
        window
    }

    /// Creates a window from a remaining fraction (0.0-1.0).
    pub fn from_remaining_fraction(label: impl Into<String>, remaining: f64) -> Self {
        let mut window = Self::from_used_percent(label, round1((1.0 - remaining) * 100.0));
        if remaining.is_finite() {
            window.remaining_percent = round1(remaining.clamp(0.0, 1.0) * 100.0);
        }
        window
    }

    /// Sets the reset instant and derives the ETA from `now`.
    #[must_use]
    pub fn with_reset(mut self, resets_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        self.resets_at = resets_at;
        self.reset_eta = ResetEta::until(resets_at, now);
        self
    }

    /// Sets the window duration.
    #[must_use]
    pub fn with_window_minutes(mut self, minutes: u32) -> Self {
        self.window_minutes = Some(minutes);
        self
    }

    /// Returns true if usage is over the limit.
    pub fn is_over_limit(&self) -> bool {
        self.used_percent >= 100.0
    }

    /// Validates the window data.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if `used_percent` is negative,
    /// greater than 100, or not a finite number.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.used_percent.is_finite() {
            return Err(CoreError::InvalidData(format!(
                "{}: used_percent is not a finite number",
                self.label
            )));
        }
        if self.used_percent < 0.0 || self.used_percent > 100.0 {
            return Err(CoreError::InvalidData(format!(
                "{}: used_percent {} out of valid range [0, 100]",
                self.label, self.used_percent
            )));
        }
        Ok(())
    }

    /// Clamps `used_percent` to [0, 100], replacing NaN/Infinity with 0.0,
    /// and recomputes `remaining_percent`.
    pub fn sanitize(&mut self) {
        if !self.used_percent.is_finite() {
            self.used_percent = 0.0;
        }
        self.used_percent = self.used_percent.clamp(0.0, 100.0);
        self.remaining_percent = round1(100.0 - self.used_percent);
    }
}

// ============================================================================
// Failures
// ============================================================================

/// Category of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No usable credential was found anywhere.
    NoCredentials,
    /// The credential was rejected (HTTP 401) or expired and could not be refreshed.
    AuthExpired,
    /// Any other non-200 response. Transport failures use status 0.
    HttpError,
}

/// Why a provider fetch did not produce usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Failure category.
    pub kind: FailureKind,
    /// HTTP status, if a request was made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Short description.
    pub message: String,
    /// Extra detail such as a response excerpt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Failure {
    /// No usable credential.
    pub fn no_credentials(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::NoCredentials,
            status: None,
            message: message.into(),
            details: None,
        }
    }

    /// Credential rejected or expired.
    pub fn auth_expired(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::AuthExpired,
            status: Some(401),
            message: message.into(),
            details: None,
        }
    }

    /// Local expiry detected and the refresh failed; no request was made.
    pub fn expired_locally(message: impl Into<String>) -> Self {
        Self {
            status: None,
            ..Self::auth_expired(message)
        }
    }

    /// Unexpected HTTP status (0 for transport failures).
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::HttpError,
            status: Some(status),
            message: message.into(),
            details: None,
        }
    }

    /// Attaches details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

// ============================================================================
// Provider Extras
// ============================================================================

/// Prepaid credit balance in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// Total credits purchased.
    pub total_credits_usd: f64,
    /// Total credits spent.
    pub total_usage_usd: f64,
    /// Credits left.
    pub balance_usd: f64,
}

impl Balance {
    /// Creates a balance from purchased and used credits.
    pub fn new(total_credits_usd: f64, total_usage_usd: f64) -> Self {
        Self {
            total_credits_usd,
            total_usage_usd,
            balance_usd: total_credits_usd - total_usage_usd,
        }
    }
}

/// Absolute quota counter (tokens or requests).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuotaCounter {
    /// Quota size.
    pub limit: u64,
    /// Amount used.
    pub used: u64,
    /// Amount left.
    pub remaining: u64,
    /// Used percentage as reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

/// Historical activity totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySummary {
    /// Number of model calls.
    pub calls: u64,
    /// Number of tokens.
    pub tokens: u64,
}

// ============================================================================
// Usage Snapshot
// ============================================================================

/// Outcome of a provider fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    /// Usage data was retrieved.
    Ok,
    /// The credential works, but no quota detail is available.
    Authenticated,
    /// Nothing usable was retrieved.
    Error,
}

/// Normalized result of one provider fetch.
///
/// Every provider-specific field is optional. A field the provider did not
/// report is `None` and is left out of the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Provider this snapshot is for.
    pub provider: ProviderKind,
    /// Overall outcome.
    pub status: SnapshotStatus,
    /// Quota windows keyed by label.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub windows: BTreeMap<String, UsageWindow>,
    /// Failure details. May accompany `Authenticated` when a fallback succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    /// Authentication method label, e.g. "OAuth (ChatGPT)".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    /// Account identity (email).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Service tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    /// Subscription plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    /// Google Cloud project configured for the CLI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp_project: Option<String>,
    /// Prepaid credit balance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Balance>,
    /// Token quota counter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_quota: Option<QuotaCounter>,
    /// Request quota counter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_quota: Option<QuotaCounter>,
    /// Activity over the last seven days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_activity: Option<ActivitySummary>,
    /// Whether the provider reports the rate limit as reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_reached: Option<bool>,
    /// Whether the access token was refreshed during this fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_refreshed: Option<bool>,
    /// Time until the access token expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_expires_in: Option<ResetEta>,
    /// Link to the provider's dashboard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
    /// Informational note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Actionable hints for the user.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

impl UsageSnapshot {
    /// Creates an empty snapshot with the given status.
    pub fn new(provider: ProviderKind, status: SnapshotStatus) -> Self {
        Self {
            provider,
            status,
            windows: BTreeMap::new(),
            failure: None,
            auth: None,
            account: None,
            tier: None,
            plan: None,
            gcp_project: None,
            balance: None,
            token_quota: None,
            request_quota: None,
            weekly_activity: None,
            limit_reached: None,
            token_refreshed: None,
            token_expires_in: None,
            dashboard_url: None,
            note: None,
            hints: Vec::new(),
        }
    }

    /// Creates an error snapshot.
    pub fn failed(provider: ProviderKind, failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(provider, SnapshotStatus::Error)
        }
    }

    /// Creates the standard "no credentials" snapshot, with the provider's setup hint.
    pub fn no_credentials(provider: ProviderKind) -> Self {
        let meta = ProviderMetadata::for_provider(provider);
        Self::failed(provider, Failure::no_credentials("No credentials found"))
            .with_hint(meta.credential_hint)
    }

    /// Adds a hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.push_hint(hint);
        self
    }

    /// Adds a hint unless it is already present.
    pub fn push_hint(&mut self, hint: impl Into<String>) {
        let hint = hint.into();
        if !self.hints.contains(&hint) {
            self.hints.push(hint);
        }
    }

    /// Inserts a window keyed by its label.
    pub fn insert_window(&mut self, window: UsageWindow) {
        self.windows.insert(window.label.clone(), window);
    }

    /// Returns a window by label.
    pub fn window(&self, label: &str) -> Option<&UsageWindow> {
        self.windows.get(label)
    }

    /// Returns the failure kind, if any.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|f| f.kind)
    }

    /// Returns true if the fetch produced nothing usable.
    pub fn is_error(&self) -> bool {
        self.status == SnapshotStatus::Error
    }

    /// Returns the highest usage percentage across all windows.
    pub fn max_used_percent(&self) -> Option<f64> {
        self.windows
            .values()
            .map(|w| w.used_percent)
            .reduce(f64::max)
    }

    /// Validates every window.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` naming the first invalid window.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.windows.values().try_for_each(UsageWindow::validate)
    }
}

// ============================================================================
// Tests
// ============================================================================
