//! OpenRouter credits parser.

use chrono::{DateTime, Utc};
use quotabar_core::{Balance, ProviderKind, ProviderMetadata, SnapshotStatus, UsageSnapshot};
use serde_json::Value;
use tracing::warn;

use crate::raw::RawUsage;

/// Endpoint name for the credits payload.
pub const CREDITS_ENDPOINT: &str = "credits";

/// Maps the credits payload into a snapshot.
pub fn normalize(raw: &RawUsage, _now: DateTime<Utc>) -> UsageSnapshot {
    let mut snapshot = UsageSnapshot::new(ProviderKind::OpenRouter, SnapshotStatus::Ok);
    snapshot.dashboard_url = ProviderMetadata::for_provider(ProviderKind::OpenRouter)
        .dashboard_url
        .map(str::to_string);

    let has_data = raw
        .get(CREDITS_ENDPOINT)
        .and_then(|payload| payload.get("data"))
        .is_some_and(Value::is_object);
    if !has_data {
        return snapshot;
    }

    // Both totals are needed for the balance; a missing one counts as zero.
    let credits = raw.decode_at::<f64>(CREDITS_ENDPOINT, "/data/total_credits");
    let usage = raw.decode_at::<f64>(CREDITS_ENDPOINT, "/data/total_usage");
    match (credits, usage) {
        (Ok(credits), Ok(usage)) => {
            snapshot.balance = Some(Balance::new(credits.unwrap_or(0.0), usage.unwrap_or(0.0)));
        }
        (Err(e), _) | (_, Err(e)) => warn!(error = %e, "Failed to parse OpenRouter credits"),
    }
    snapshot
}
