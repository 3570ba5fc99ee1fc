//! Z.AI usage fetcher.

use chrono::{DateTime, Duration, Utc};
use quotabar_core::{Failure, ProviderKind, ProviderMetadata, SnapshotStatus, UsageSnapshot};
use quotabar_fetch::FetchContext;
use tracing::{debug, instrument, warn};
use url::Url;

use super::credentials::zai_resolver;
use super::parser::{DASHBOARD_HINT, HISTORY_ENDPOINT, QUOTA_ENDPOINT, is_success, normalize};
use crate::raw::RawUsage;

/// Quota limits endpoint.
pub const QUOTA_URL: &str = "https://api.z.ai/api/monitor/usage/quota/limit";

/// Model usage history endpoint.
pub const MODEL_USAGE_URL: &str = "https://api.z.ai/api/monitor/usage/model-usage";

/// Chat API auth check.
pub const LIVENESS_URL: &str = "https://chat.z.ai/api/v1/auths/";

/// Dashboard shown when no key is configured.
const BILLING_URL: &str = "https://z.ai/billing";

/// Days of history requested.
const HISTORY_DAYS: i64 = 7;

/// Builds the history URL covering the last seven UTC days.
///
/// # Errors
///
/// Returns an error if the base URL does not parse.
pub fn history_url(now: DateTime<Utc>) -> Result<Url, url::ParseError> {
    let today = now.date_naive();
    let start = today - Duration::days(HISTORY_DAYS);
    Url::parse_with_params(
        MODEL_USAGE_URL,
        &[
            ("startTime", format!("{} 00:00:00", start.format("%Y-%m-%d"))),
            ("endTime", format!("{} 23:59:59", today.format("%Y-%m-%d"))),
        ],
    )
}

/// Neither monitor payload succeeded: classify the quota status, or confirm
/// the key against the chat API.
async fn unavailable(
    ctx: &FetchContext,
    meta: &ProviderMetadata,
    key: &str,
    quota_status: u16,
    quota_excerpt: String,
) -> UsageSnapshot {
    if quota_status == 401 {
        return UsageSnapshot::failed(meta.kind, Failure::auth_expired("Invalid API key"))
            .with_hint(meta.reauth_hint);
    }

    let bearer = format!("Bearer {key}");
    let liveness = ctx
        .http
        .get(
            LIVENESS_URL,
            &[
                ("Authorization", bearer.as_str()),
                ("Content-Type", "application/json"),
            ],
        )
        .await;
    if liveness.is_ok() {
        debug!("Z.AI key accepted by chat API");
        return UsageSnapshot::new(meta.kind, SnapshotStatus::Authenticated);
    }

    warn!(status = quota_status, "Z.AI quota request failed");
    UsageSnapshot::failed(
        meta.kind,
        Failure::http(quota_status, format!("HTTP {quota_status}")).with_details(quota_excerpt),
    )
}

/// Fetches Z.AI usage.
#[instrument(skip(ctx))]
pub async fn fetch_usage(ctx: &FetchContext) -> UsageSnapshot {
    let provider = ProviderKind::Zai;
    let meta = ProviderMetadata::for_provider(provider);

    let Some(key) = zai_resolver()
        .resolve(ctx)
        .await
        .and_then(|credential| credential.api_key)
    else {
        let mut snapshot = UsageSnapshot::no_credentials(provider);
        snapshot.dashboard_url = Some(BILLING_URL.to_string());
        return snapshot;
    };

    let headers = [
        ("Authorization", key.as_str()),
        ("Content-Type", "application/json"),
    ];

    let mut raw = RawUsage::new();

    let quota = ctx.http.get(QUOTA_URL, &headers).await;
    match quota.ok_json().filter(|body| is_success(body)) {
        Some(body) => raw.insert(QUOTA_ENDPOINT, body.clone()),
        None => debug!(status = quota.status, "Z.AI quota unavailable"),
    }

    match history_url(ctx.now()) {
        Ok(url) => {
            let history = ctx.http.get(url.as_str(), &headers).await;
            match history.ok_json().filter(|body| is_success(body)) {
                Some(body) => raw.insert(HISTORY_ENDPOINT, body.clone()),
                None => debug!(status = history.status, "Z.AI history unavailable"),
            }
        }
        Err(e) => warn!(error = %e, "Invalid Z.AI history URL"),
    }

    let mut snapshot = if raw.is_empty() {
        unavailable(ctx, &meta, &key, quota.status, quota.excerpt(200)).await
    } else {
        let mut snapshot = normalize(&raw, ctx.now());
        snapshot.dashboard_url = meta.dashboard_url.map(str::to_string);
        snapshot
    };

    snapshot.push_hint(DASHBOARD_HINT);
    snapshot
}
