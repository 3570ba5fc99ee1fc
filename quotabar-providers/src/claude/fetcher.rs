//! Claude usage fetcher.

use quotabar_core::{Failure, ProviderKind, ProviderMetadata, UsageSnapshot};
use quotabar_fetch::FetchContext;
use tracing::{debug, instrument, warn};

use super::credentials::claude_resolver;
use super::parser::{USAGE_ENDPOINT, normalize};
use crate::raw::RawUsage;

/// OAuth usage endpoint.
pub const USAGE_URL: &str = "https://api.anthropic.com/api/oauth/usage";

/// Beta header required by the OAuth endpoints.
const ANTHROPIC_BETA: &str = "oauth-2025-04-20";

/// Fetches Claude usage.
#[instrument(skip(ctx))]
pub async fn fetch_usage(ctx: &FetchContext) -> UsageSnapshot {
    let provider = ProviderKind::Claude;
    let meta = ProviderMetadata::for_provider(provider);

    let Some(credential) = claude_resolver().resolve(ctx).await else {
        return UsageSnapshot::no_credentials(provider);
    };
    let Some(token) = credential.access_token.as_deref() else {
        return UsageSnapshot::no_credentials(provider);
    };

    let auth = format!("Bearer {token}");
    let response = ctx
        .http
        .get(
            USAGE_URL,
            &[
                ("Authorization", auth.as_str()),
                ("anthropic-beta", ANTHROPIC_BETA),
                ("Content-Type", "application/json"),
            ],
        )
        .await;

    if let Some(body) = response.ok_json().filter(|v| v.is_object()) {
        let raw = RawUsage::new().with(USAGE_ENDPOINT, body.clone());
        let mut snapshot = normalize(&raw, ctx.now());
        snapshot.plan = credential.plan;
        return snapshot;
    }

    if response.status == 401 {
        debug!("Claude token rejected");
        return UsageSnapshot::failed(provider, Failure::auth_expired("Token expired"))
            .with_hint(meta.reauth_hint);
    }

    warn!(status = response.status, "Claude usage request failed");
    UsageSnapshot::failed(
        provider,
        Failure::http(response.status, format!("HTTP {}", response.status))
            .with_details(response.excerpt(200)),
    )
}
