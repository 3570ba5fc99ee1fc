//! OpenRouter usage fetcher.

use quotabar_core::{Failure, ProviderKind, ProviderMetadata, UsageSnapshot};
use quotabar_fetch::FetchContext;
use tracing::{instrument, warn};

use super::credentials::openrouter_resolver;
use super::parser::{CREDITS_ENDPOINT, normalize};
use crate::raw::RawUsage;

/// Credits endpoint.
pub const CREDITS_URL: &str = "https://openrouter.ai/api/v1/credits";

/// Fetches the OpenRouter balance.
#[instrument(skip(ctx))]
pub async fn fetch_usage(ctx: &FetchContext) -> UsageSnapshot {
    let provider = ProviderKind::OpenRouter;
    let meta = ProviderMetadata::for_provider(provider);

    let Some(key) = openrouter_resolver()
        .resolve(ctx)
        .await
        .and_then(|credential| credential.api_key)
    else {
        return UsageSnapshot::no_credentials(provider);
    };

    let auth = format!("Bearer {key}");
    let response = ctx
        .http
        .get(CREDITS_URL, &[("Authorization", auth.as_str())])
        .await;

    if let Some(body) = response.ok_json().filter(|v| v.get("data").is_some()) {
        let raw = RawUsage::new().with(CREDITS_ENDPOINT, body.clone());
        return normalize(&raw, ctx.now());
    }

    match response.status {
        401 => UsageSnapshot::failed(provider, Failure::auth_expired("Invalid API key"))
            .with_hint(meta.reauth_hint),
        403 => UsageSnapshot::failed(provider, Failure::http(403, "Forbidden"))
            .with_hint("Account may be suspended"),
        status => {
            warn!(status, "OpenRouter credits request failed");
            UsageSnapshot::failed(
                provider,
                Failure::http(status, format!("API error ({status})"))
                    .with_details(response.excerpt(200)),
            )
        }
    }
}
