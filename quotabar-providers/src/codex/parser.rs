//! Codex response parsers.

use chrono::{DateTime, Utc};
use quotabar_core::{
    ProviderKind, SnapshotStatus, UsageSnapshot, UsageWindow, reset_from_relative_seconds,
};
use serde::Deserialize;
use tracing::debug;

use crate::raw::RawUsage;

/// Endpoint name for the ChatGPT usage payload.
pub const USAGE_ENDPOINT: &str = "usage";

/// Auth label for the ChatGPT OAuth path.
pub const OAUTH_AUTH_LABEL: &str = "OAuth (ChatGPT)";

const DEFAULT_PRIMARY_SECONDS: i64 = 18_000;
const DEFAULT_SECONDARY_SECONDS: i64 = 604_800;
const SECONDS_PER_DAY: i64 = 86_400;

// ============================================================================
// API Response Structures
// ============================================================================

/// One rate-limit window from `backend-api/wham/usage`.
///
/// The payload carries `rate_limit.primary_window` (5 hours by default),
/// `rate_limit.secondary_window` (7 days by default) and
/// `code_review_rate_limit.primary_window`.
#[derive(Debug, Default, Deserialize)]
pub struct RateWindow {
    /// Percentage used.
    #[serde(default)]
    pub used_percent: Option<f64>,
    /// Window length.
    #[serde(default)]
    pub limit_window_seconds: Option<i64>,
    /// Seconds until the window resets.
    #[serde(default)]
    pub reset_after_seconds: Option<i64>,
}

// ============================================================================
// Normalization
// ============================================================================

/// Label for a window length: whole days as `"{d}d"`, otherwise `"{h}h"`.
pub fn window_label(seconds: i64) -> String {
    if seconds >= SECONDS_PER_DAY && seconds % SECONDS_PER_DAY == 0 {
        format!("{}d", seconds / SECONDS_PER_DAY)
    } else {
        format!("{}h", seconds / 3600)
    }
}

fn rate_window(data: &RateWindow, default_seconds: i64, now: DateTime<Utc>) -> UsageWindow {
    let seconds = data.limit_window_seconds.unwrap_or(default_seconds);
    let resets_at = data
        .reset_after_seconds
        .and_then(|secs| reset_from_relative_seconds(secs, now));

    UsageWindow::from_used_percent(window_label(seconds), data.used_percent.unwrap_or(0.0))
        .with_window_minutes(u32::try_from(seconds / 60).unwrap_or(u32::MAX))
        .with_reset(resets_at, now)
}

/// Maps the ChatGPT usage payload into a snapshot.
pub fn normalize(raw: &RawUsage, now: DateTime<Utc>) -> UsageSnapshot {
    let mut snapshot = UsageSnapshot::new(ProviderKind::Codex, SnapshotStatus::Ok);
    snapshot.auth = Some(OAUTH_AUTH_LABEL.to_string());

    snapshot.plan = raw
        .field::<String>(USAGE_ENDPOINT, "/plan_type")
        .filter(|p| !p.is_empty());

    let windows = [
        ("/rate_limit/primary_window", DEFAULT_PRIMARY_SECONDS),
        ("/rate_limit/secondary_window", DEFAULT_SECONDARY_SECONDS),
    ];
    for (pointer, default_seconds) in windows {
        if let Some(data) = raw.field::<RateWindow>(USAGE_ENDPOINT, pointer) {
            let mut window = rate_window(&data, default_seconds, now);
            if snapshot.window(&window.label).is_some() {
                window.label = format!("{}_secondary", window.label);
            }
            snapshot.insert_window(window);
        }
    }

    if raw.field::<bool>(USAGE_ENDPOINT, "/rate_limit/limit_reached") == Some(true) {
        snapshot.limit_reached = Some(true);
    }

    if let Some(review) =
        raw.field::<RateWindow>(USAGE_ENDPOINT, "/code_review_rate_limit/primary_window")
    {
        snapshot.insert_window(UsageWindow::from_used_percent(
            "code_review",
            review.used_percent.unwrap_or(0.0),
        ));
    }

    debug!(windows = snapshot.windows.len(), plan = ?snapshot.plan, "Codex usage parsed");
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
    fn test_window_labels() {
        assert_eq!(window_label(18_000), "5h");
        assert_eq!(window_label(604_800), "7d");
        assert_eq!(window_label(86_400), "1d");
        assert_eq!(window_label(3_600), "1h");
        assert_eq!(window_label(90_000), "25h");
    }

    #[test]
    fn test_normalize_full_payload() {
        let raw = RawUsage::new().with(
            USAGE_ENDPOINT,
            json!({
                "plan_type": "plus",
                "rate_limit": {
                    "primary_window": {"used_percent": 12, "limit_window_seconds": 18000, "reset_after_seconds": 3600},
                    "secondary_window": {"used_percent": 40.5, "reset_after_seconds": 0},
                    "limit_reached": false
                },
                "code_review_rate_limit": {"primary_window": {"used_percent": 5}}
            }),
        );

        let snapshot = normalize(&raw, now());
        assert_eq!(snapshot.auth.as_deref(), Some(OAUTH_AUTH_LABEL));
        assert_eq!(snapshot.plan.as_deref(), Some("plus"));
        assert_eq!(snapshot.limit_reached, None);

        let primary = snapshot.window("5h").unwrap();
        assert_eq!(primary.used_percent, 12.0);
        assert_eq!(primary.window_minutes, Some(300));
        assert_eq!(primary.reset_eta, ResetEta::In { seconds: 3600 });

        let secondary = snapshot.window("7d").unwrap();
        assert_eq!(secondary.remaining_percent, 59.5);
        assert_eq!(secondary.window_minutes, Some(10_080));
        assert_eq!(secondary.reset_eta, ResetEta::NotAvailable);

        assert_eq!(snapshot.window("code_review").unwrap().used_percent, 5.0);
    }

    #[test]
    fn test_limit_reached() {
        let raw = RawUsage::new().with(
            USAGE_ENDPOINT,
            json!({"rate_limit": {"primary_window": {"used_percent": 100}, "limit_reached": true}}),
        );
        let snapshot = normalize(&raw, now());
        assert_eq!(snapshot.limit_reached, Some(true));
        assert!(snapshot.window("5h").unwrap().is_over_limit());
    }

    #[test]
    fn test_equal_length_windows_are_both_kept() {
        let raw = RawUsage::new().with(
            USAGE_ENDPOINT,
            json!({"rate_limit": {
                "primary_window": {"used_percent": 10, "limit_window_seconds": 18000},
                "secondary_window": {"used_percent": 30, "limit_window_seconds": 18000}
            }}),
        );

        let snapshot = normalize(&raw, now());
        assert_eq!(snapshot.windows.len(), 2);
        assert_eq!(snapshot.window("5h").unwrap().used_percent, 10.0);
        assert_eq!(snapshot.window("5h_secondary").unwrap().used_percent, 30.0);
    }

    #[test]
    fn test_drifted_window_keeps_the_others() {
        let raw = RawUsage::new().with(
            USAGE_ENDPOINT,
            json!({
                "plan_type": "pro",
                "rate_limit": {
                    "primary_window": {"used_percent": "high"},
                    "secondary_window": {"used_percent": 40, "limit_window_seconds": 604800}
                }
            }),
        );

        let snapshot = normalize(&raw, now());
        assert_eq!(snapshot.plan.as_deref(), Some("pro"));
        assert!(snapshot.window("5h").is_none());
        assert_eq!(snapshot.window("7d").unwrap().used_percent, 40.0);
    }

    #[test]
    fn test_huge_reset_offset_is_not_available() {
        let raw = RawUsage::new().with(
            USAGE_ENDPOINT,
            json!({"rate_limit": {"primary_window": {
                "used_percent": 5,
                "limit_window_seconds": 18000,
                "reset_after_seconds": i64::MAX
            }}}),
        );

        let window = normalize(&raw, now()).window("5h").cloned().unwrap();
        assert_eq!(window.used_percent, 5.0);
        assert_eq!(window.reset_eta, ResetEta::NotAvailable);
    }

    #[test]
    fn test_empty_payload() {
        let raw = RawUsage::new().with(USAGE_ENDPOINT, json!({}));
        let snapshot = normalize(&raw, now());
        assert!(snapshot.windows.is_empty());
        assert_eq!(snapshot.plan, None);
    }
}
