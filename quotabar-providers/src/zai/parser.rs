//! Z.AI monitor API parsers.

use chrono::{DateTime, Utc};
use quotabar_core::{
    ActivitySummary, ProviderKind, QuotaCounter, SnapshotStatus, UsageSnapshot, UsageWindow,
    reset_from_epoch_millis,
};
use serde::Deserialize;
use tracing::debug;

use crate::raw::RawUsage;

/// Endpoint name for the quota payload.
pub const QUOTA_ENDPOINT: &str = "quota";

/// Endpoint name for the 7-day model usage payload.
pub const HISTORY_ENDPOINT: &str = "model-usage";

/// Hint attached to every Z.AI snapshot.
pub const DASHBOARD_HINT: &str = "Dashboard: https://z.ai/manage-apikey/billing";

/// Length of the shared token window.
const TOKEN_WINDOW_MINUTES: u32 = 300;

// ============================================================================
// API Response Structures
// ============================================================================

/// A single entry of `data.limits` from `quota/limit`.
///
/// Monitor payloads share the envelope `{"success": bool, "data": ...}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaLimit {
    /// `TOKENS_LIMIT` or `TIME_LIMIT`.
    #[serde(rename = "type", default)]
    pub limit_type: Option<String>,
    /// Total allowance.
    #[serde(default)]
    pub usage: Option<u64>,
    /// Amount used.
    #[serde(default)]
    pub current_value: Option<u64>,
    /// Amount left.
    #[serde(default)]
    pub remaining: Option<u64>,
    /// Percentage used.
    #[serde(default)]
    pub percentage: Option<f64>,
    /// Next reset, epoch milliseconds.
    #[serde(default)]
    pub next_reset_time: Option<i64>,
}

impl QuotaLimit {
    fn counter(&self) -> QuotaCounter {
        QuotaCounter {
            limit: self.usage.unwrap_or(0),
            used: self.current_value.unwrap_or(0),
            remaining: self.remaining.unwrap_or(0),
            percentage: self.percentage,
        }
    }
}

/// `data.totalUsage` from `model-usage`: totals over the requested range.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalUsage {
    /// Number of model calls.
    #[serde(default)]
    pub total_model_call_count: Option<u64>,
    /// Tokens consumed.
    #[serde(default)]
    pub total_tokens_usage: Option<u64>,
}

/// Returns true if a monitor payload reports `success: true`.
pub fn is_success(payload: &serde_json::Value) -> bool {
    payload.get("success").and_then(serde_json::Value::as_bool) == Some(true)
}

// ============================================================================
// Normalization
// ============================================================================

fn succeeded(raw: &RawUsage, endpoint: &str) -> bool {
    raw.get(endpoint).is_some_and(is_success)
}

/// Maps the monitor payloads into a snapshot.
pub fn normalize(raw: &RawUsage, now: DateTime<Utc>) -> UsageSnapshot {
    let mut snapshot = UsageSnapshot::new(ProviderKind::Zai, SnapshotStatus::Ok);

    if succeeded(raw, QUOTA_ENDPOINT) {
        for limit in raw.items::<QuotaLimit>(QUOTA_ENDPOINT, "/data/limits") {
            match limit.limit_type.as_deref() {
                Some("TOKENS_LIMIT") => {
                    let resets_at = limit.next_reset_time.and_then(reset_from_epoch_millis);
                    snapshot.insert_window(
                        UsageWindow::from_used_percent("tokens", limit.percentage.unwrap_or(0.0))
                            .with_window_minutes(TOKEN_WINDOW_MINUTES)
                            .with_reset(resets_at, now),
                    );
                    snapshot.token_quota = Some(limit.counter());
                }
                Some("TIME_LIMIT") => snapshot.request_quota = Some(limit.counter()),
                other => debug!(limit_type = ?other, "Ignoring Z.AI limit"),
            }
        }
    }

    let total = succeeded(raw, HISTORY_ENDPOINT)
        .then(|| raw.field::<TotalUsage>(HISTORY_ENDPOINT, "/data/totalUsage"))
        .flatten();
    if let Some(total) = total {
        snapshot.weekly_activity = Some(ActivitySummary {
            calls: total.total_model_call_count.unwrap_or(0),
            tokens: total.total_tokens_usage.unwrap_or(0),
        });
    }

    snapshot.push_hint(DASHBOARD_HINT);
    snapshot
}

// ============================================================================
// Tests
// ============================================================================
