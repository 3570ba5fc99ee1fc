//! Gemini response parsers.

use chrono::{DateTime, Utc};
use quotabar_core::{
    ProviderKind, SnapshotStatus, UsageSnapshot, UsageWindow, parse_reset_timestamp,
};
use serde::Deserialize;
use tracing::debug;

use crate::raw::RawUsage;

/// Endpoint name for the `loadCodeAssist` payload.
pub const LOAD_ENDPOINT: &str = "loadCodeAssist";

/// Endpoint name for the `retrieveUserQuota` payload.
pub const QUOTA_ENDPOINT: &str = "retrieveUserQuota";

/// Auth label for the Google OAuth path.
pub const OAUTH_AUTH_LABEL: &str = "OAuth (Google Account)";

/// Quota tiers in display order, each with the models sharing that quota.
pub const MODEL_TIERS: [(&str, &[&str]); 3] = [
    ("3-Flash", &["gemini-3-flash-preview"]),
    (
        "Flash",
        &["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.0-flash"],
    ),
    ("Pro", &["gemini-2.5-pro", "gemini-3-pro-preview"]),
];

/// Returns the tier a model belongs to.
pub fn model_tier(model_id: &str) -> Option<&'static str> {
    MODEL_TIERS
        .iter()
        .find(|(_, models)| models.contains(&model_id))
        .map(|(tier, _)| *tier)
}

/// Returns one window per tier: the first tier model present in the snapshot.
pub fn tier_windows(snapshot: &UsageSnapshot) -> Vec<(&'static str, &UsageWindow)> {
    MODEL_TIERS
        .iter()
        .filter_map(|(tier, models)| {
            models
                .iter()
                .find_map(|model| snapshot.window(model))
                .map(|window| (*tier, window))
        })
        .collect()
}

// ============================================================================
// API Response Structures
// ============================================================================

/// `currentTier` from `loadCodeAssist`.
#[derive(Debug, Default, Deserialize)]
pub struct CurrentTier {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Tier id.
    #[serde(default)]
    pub id: Option<String>,
}

/// A per-model entry of `buckets` from `retrieveUserQuota`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaBucket {
    /// Model id.
    #[serde(default)]
    pub model_id: Option<String>,
    /// Remaining fraction (0.0-1.0).
    #[serde(default)]
    pub remaining_fraction: Option<f64>,
    /// ISO-8601 reset time.
    #[serde(default)]
    pub reset_time: Option<String>,
}

impl CurrentTier {
    /// Returns the tier label: name, else id, else "unknown".
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Returns the Code Assist project id from the `loadCodeAssist` payload.
pub fn code_assist_project(raw: &RawUsage) -> Option<String> {
    raw.field::<String>(LOAD_ENDPOINT, "/cloudaicompanionProject")
        .filter(|p| !p.is_empty())
}

// ============================================================================
// Normalization
// ============================================================================

fn bucket_window(bucket: &QuotaBucket, now: DateTime<Utc>) -> UsageWindow {
    let label = bucket.model_id.as_deref().unwrap_or("unknown");
    let resets_at = bucket
        .reset_time
        .as_deref()
        .and_then(parse_reset_timestamp);
    UsageWindow::from_remaining_fraction(label, bucket.remaining_fraction.unwrap_or(0.0))
        .with_reset(resets_at, now)
}

/// Maps the Code Assist payloads into a snapshot.
pub fn normalize(raw: &RawUsage, now: DateTime<Utc>) -> UsageSnapshot {
    let mut snapshot = UsageSnapshot::new(ProviderKind::Gemini, SnapshotStatus::Ok);
    snapshot.auth = Some(OAUTH_AUTH_LABEL.to_string());

    snapshot.tier = raw
        .field::<CurrentTier>(LOAD_ENDPOINT, "/currentTier")
        .map(|tier| tier.label());

    for bucket in raw.items::<QuotaBucket>(QUOTA_ENDPOINT, "/buckets") {
        snapshot.insert_window(bucket_window(&bucket, now));
    }

    debug!(tier = ?snapshot.tier, windows = snapshot.windows.len(), "Gemini usage parsed");
    snapshot
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use quotabar_core::ResetEta;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 3, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_model_tier() {
        assert_eq!(model_tier("gemini-2.5-flash-lite"), Some("Flash"));
        assert_eq!(model_tier("gemini-3-pro-preview"), Some("Pro"));
        assert_eq!(model_tier("gemini-1.0-ultra"), None);
    }

    #[test]
    fn test_normalize_buckets() {
        let raw = RawUsage::new()
            .with(LOAD_ENDPOINT, json!({"currentTier": {"id": "free-tier", "name": "Free"}}))
            .with(
                QUOTA_ENDPOINT,
                json!({"buckets": [
                    {"modelId": "gemini-2.5-pro", "remainingFraction": 0.25, "resetTime": "2025-01-04T00:00:00Z"},
                    {"modelId": "gemini-2.0-flash", "remainingFraction": 1.0},
                    {"remainingFraction": 0.5}
                ]}),
            );

        let snapshot = normalize(&raw, now());
        assert_eq!(snapshot.tier.as_deref(), Some("Free"));
        assert_eq!(snapshot.auth.as_deref(), Some(OAUTH_AUTH_LABEL));

        let pro = snapshot.window("gemini-2.5-pro").unwrap();
        assert_eq!(pro.used_percent, 75.0);
        assert_eq!(pro.remaining_percent, 25.0);
        assert_eq!(pro.reset_eta, ResetEta::In { seconds: 14 * 3600 });

        let flash = snapshot.window("gemini-2.0-flash").unwrap();
        assert_eq!(flash.used_percent, 0.0);
        assert_eq!(flash.reset_eta, ResetEta::NotAvailable);

        assert!(snapshot.window("unknown").is_some());
    }

    #[test]
    fn test_tier_falls_back_to_id() {
        let raw = RawUsage::new().with(LOAD_ENDPOINT, json!({"currentTier": {"id": "standard-tier"}}));
        assert_eq!(normalize(&raw, now()).tier.as_deref(), Some("standard-tier"));

        let raw = RawUsage::new().with(LOAD_ENDPOINT, json!({"currentTier": {}}));
        assert_eq!(normalize(&raw, now()).tier.as_deref(), Some("unknown"));

        let raw = RawUsage::new().with(LOAD_ENDPOINT, json!({}));
        assert_eq!(normalize(&raw, now()).tier, None);
    }

    #[test]
    fn test_drifted_bucket_keeps_the_others() {
        let raw = RawUsage::new()
            .with(LOAD_ENDPOINT, json!({"currentTier": "free", "cloudaicompanionProject": "p1"}))
            .with(
                QUOTA_ENDPOINT,
                json!({"buckets": [
                    {"modelId": "gemini-2.5-pro", "remainingFraction": "most"},
                    {"modelId": "gemini-2.5-flash", "remainingFraction": 0.8}
                ]}),
            );

        let snapshot = normalize(&raw, now());
        assert_eq!(snapshot.tier, None);
        assert_eq!(code_assist_project(&raw).as_deref(), Some("p1"));
        assert!(snapshot.window("gemini-2.5-pro").is_none());
        assert_eq!(snapshot.window("gemini-2.5-flash").unwrap().used_percent, 20.0);
    }

    #[test]
    fn test_tier_windows_pick_first_model() {
        let raw = RawUsage::new().with(
            QUOTA_ENDPOINT,
            json!({"buckets": [
                {"modelId": "gemini-2.0-flash", "remainingFraction": 0.9},
                {"modelId": "gemini-2.5-flash", "remainingFraction": 0.5},
                {"modelId": "gemini-3-pro-preview", "remainingFraction": 0.1}
            ]}),
        );
        let snapshot = normalize(&raw, now());
        let tiers: Vec<_> = tier_windows(&snapshot)
            .into_iter()
            .map(|(tier, w)| (tier, w.used_percent))
            .collect();
        assert_eq!(tiers, vec![("Flash", 50.0), ("Pro", 90.0)]);
    }
}
