//! Parser edge case tests.
//!
//! These tests run every provider's normalizer over malformed, partial, or
//! boundary payloads.

use chrono::{DateTime, TimeZone, Utc};
use quotabar_core::{ResetEta, SnapshotStatus};
use serde_json::{Value, json};

use crate::raw::RawUsage;
use crate::registry::ProviderRegistry;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 3, 10, 0, 0).unwrap()
}

/// Endpoint names each provider's normalizer reads.
fn endpoints() -> [&'static str; 7] {
    [
        crate::claude::parser::USAGE_ENDPOINT,
        crate::codex::parser::USAGE_ENDPOINT,
        crate::gemini::parser::LOAD_ENDPOINT,
        crate::gemini::parser::QUOTA_ENDPOINT,
        crate::zai::parser::QUOTA_ENDPOINT,
        crate::zai::parser::HISTORY_ENDPOINT,
        crate::openrouter::parser::CREDITS_ENDPOINT,
    ]
}

fn everywhere(payload: &Value) -> RawUsage {
    endpoints()
        .into_iter()
        .fold(RawUsage::new(), |raw, endpoint| raw.with(endpoint, payload.clone()))
}

// ============================================================================
// Cross-Provider
// ============================================================================

#[test]
fn test_empty_raw_usage() {
    for desc in ProviderRegistry::all() {
        let snapshot = desc.normalize(&RawUsage::new(), now());
        assert_eq!(snapshot.provider, desc.kind);
        assert_eq!(snapshot.status, SnapshotStatus::Ok, "{}", desc.kind);
        assert!(snapshot.windows.is_empty(), "{}", desc.kind);
        assert!(snapshot.failure.is_none());
    }
}

#[test]
fn test_wrong_shapes_do_not_panic() {
    for payload in [json!([]), json!("text"), json!(null), json!(42), json!({"data": []})] {
        let raw = everywhere(&payload);
        for desc in ProviderRegistry::all() {
            let snapshot = desc.normalize(&raw, now());
            assert!(snapshot.windows.is_empty(), "{} with {payload}", desc.kind);
            assert!(!snapshot.is_error());
        }
    }
}

#[test]
fn test_normalize_is_deterministic() {
    let raw = RawUsage::new()
        .with(
            crate::claude::parser::USAGE_ENDPOINT,
            json!({"five_hour": {"utilization": 10, "resets_at": "2025-01-03T11:00:00Z"}}),
        )
        .with(
            crate::gemini::parser::QUOTA_ENDPOINT,
            json!({"buckets": [{"modelId": "gemini-2.5-pro", "remainingFraction": 0.3}]}),
        );
    for desc in ProviderRegistry::all() {
        assert_eq!(desc.normalize(&raw, now()), desc.normalize(&raw, now()));
    }
}

// ============================================================================
// Boundary Values
// ============================================================================

#[test]
fn test_percentages_are_clamped() {
    let raw = RawUsage::new().with(
        crate::claude::parser::USAGE_ENDPOINT,
        json!({
            "five_hour": {"utilization": 130.0},
            "seven_day": {"utilization": -5.0}
        }),
    );
    let snapshot = crate::claude::normalize(&raw, now());
    let five = snapshot.window("5h").unwrap();
    assert_eq!((five.used_percent, five.remaining_percent), (100.0, 0.0));
    let seven = snapshot.window("7d").unwrap();
    assert_eq!((seven.used_percent, seven.remaining_percent), (0.0, 100.0));
}

#[test]
fn test_remaining_fraction_out_of_range() {
    let raw = RawUsage::new().with(
        crate::gemini::parser::QUOTA_ENDPOINT,
        json!({"buckets": [
            {"modelId": "over", "remainingFraction": 1.5},
            {"modelId": "under", "remainingFraction": -0.2}
        ]}),
    );
    let snapshot = crate::gemini::normalize(&raw, now());
    let over = snapshot.window("over").unwrap();
    assert_eq!((over.used_percent, over.remaining_percent), (0.0, 100.0));
    let under = snapshot.window("under").unwrap();
    assert_eq!((under.used_percent, under.remaining_percent), (100.0, 0.0));
}

#[test]
fn test_reset_in_the_past() {
    let raw = RawUsage::new().with(
        crate::claude::parser::USAGE_ENDPOINT,
        json!({"five_hour": {"utilization": 1, "resets_at": "2025-01-03T09:00:00Z"}}),
    );
    let window = crate::claude::normalize(&raw, now()).window("5h").cloned().unwrap();
    assert_eq!(window.reset_eta, ResetEta::Now);
    assert_eq!(window.reset_eta.to_string(), "Now");
}

#[test]
fn test_reset_with_offset() {
    let raw = RawUsage::new().with(
        crate::claude::parser::USAGE_ENDPOINT,
        json!({"seven_day": {"utilization": 1, "resets_at": "2025-01-03T12:00:00+02:00"}}),
    );
    let window = crate::claude::normalize(&raw, now()).window("7d").cloned().unwrap();
    assert_eq!(window.reset_eta, ResetEta::Now);
}

#[test]
fn test_zero_epoch_reset_is_not_available() {
    let raw = RawUsage::new().with(
        crate::zai::parser::QUOTA_ENDPOINT,
        json!({"success": true, "data": {"limits": [
            {"type": "TOKENS_LIMIT", "percentage": 3, "nextResetTime": 0}
        ]}}),
    );
    let snapshot = crate::zai::normalize(&raw, now());
    assert_eq!(snapshot.window("tokens").unwrap().reset_eta, ResetEta::NotAvailable);
}

#[test]
fn test_codex_non_day_window() {
    let raw = RawUsage::new().with(
        crate::codex::parser::USAGE_ENDPOINT,
        json!({"rate_limit": {"secondary_window": {"used_percent": 1, "limit_window_seconds": 129600}}}),
    );
    let snapshot = crate::codex::normalize(&raw, now());
    let window = snapshot.window("36h").unwrap();
    assert_eq!(window.window_minutes, Some(2160));
}
