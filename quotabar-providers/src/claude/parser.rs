//! Claude response parsers.

use chrono::{DateTime, Utc};
use quotabar_core::{ProviderKind, SnapshotStatus, UsageSnapshot, UsageWindow, parse_reset_timestamp};
use serde::Deserialize;
use tracing::debug;

use crate::raw::RawUsage;

/// Endpoint name for the usage payload.
pub const USAGE_ENDPOINT: &str = "usage";

// ============================================================================
// API Response Structures
// ============================================================================

/// A single usage window from the OAuth usage endpoint.
///
/// The payload holds `five_hour`, `seven_day` and `seven_day_opus` windows,
/// each decoded on its own.
#[derive(Debug, Default, Deserialize)]
pub struct ClaudeWindow {
    /// Percentage used (0-100).
    #[serde(default)]
    pub utilization: Option<f64>,
    /// Reset timestamp (ISO 8601).
    #[serde(default)]
    pub resets_at: Option<String>,
}

// ============================================================================
// Normalization
// ============================================================================

fn window(label: &str, minutes: u32, data: &ClaudeWindow, now: DateTime<Utc>) -> UsageWindow {
    let resets_at = data.resets_at.as_deref().and_then(parse_reset_timestamp);
    UsageWindow::from_used_percent(label, data.utilization.unwrap_or(0.0))
        .with_window_minutes(minutes)
        .with_reset(resets_at, now)
}

/// Maps the usage payload into a snapshot.
pub fn normalize(raw: &RawUsage, now: DateTime<Utc>) -> UsageSnapshot {
    let mut snapshot = UsageSnapshot::new(ProviderKind::Claude, SnapshotStatus::Ok);

    let windows = [
        ("5h", 300, "/five_hour"),
        ("7d", 10_080, "/seven_day"),
        ("opus", 10_080, "/seven_day_opus"),
    ];
    for (label, minutes, pointer) in windows {
        if let Some(data) = raw.field::<ClaudeWindow>(USAGE_ENDPOINT, pointer) {
            snapshot.insert_window(window(label, minutes, &data, now));
        }
    }

    debug!(windows = snapshot.windows.len(), "Claude usage parsed");
    snapshot
}

// ============================================================================
// Tests
// ============================================================================
