//! Codex usage fetcher.
//!
//! Tries the ChatGPT OAuth path first, then falls back to validating the
//! API key against the models endpoint.

use quotabar_core::{Credential, Failure, ProviderKind, ProviderMetadata, SnapshotStatus, UsageSnapshot};
use quotabar_fetch::FetchContext;
use tracing::{debug, instrument, warn};

use super::auth::codex_resolver;
use super::parser::{USAGE_ENDPOINT, normalize};
use crate::raw::RawUsage;

/// ChatGPT backend usage endpoint.
pub const USAGE_URL: &str = "https://chatgpt.com/backend-api/wham/usage";

/// Models endpoint used to validate an API key.
pub const MODELS_URL: &str = "https://api.openai.com/v1/models";

const API_KEY_AUTH_LABEL: &str = "API Key";
const API_KEY_NOTE: &str = "API key valid but no subscription quota API";
const API_KEY_HINT: &str = "Check usage at https://platform.openai.com/usage";

/// Outcome of the OAuth path when it produced no usage.
#[derive(Debug, Clone, Copy)]
struct OAuthMiss {
    status: u16,
}

async fn fetch_oauth(
    ctx: &FetchContext,
    token: &str,
    account_id: &str,
) -> Result<UsageSnapshot, OAuthMiss> {
    let auth = format!("Bearer {token}");
    let response = ctx
        .http
        .get(
            USAGE_URL,
            &[
                ("Authorization", auth.as_str()),
                ("chatgpt-account-id", account_id),
                ("User-Agent", "codex-cli"),
                ("Content-Type", "application/json"),
            ],
        )
        .await;

    match response.ok_json().filter(|v| v.is_object()) {
        Some(body) => {
            let raw = RawUsage::new().with(USAGE_ENDPOINT, body.clone());
            Ok(normalize(&raw, ctx.now()))
        }
        None => {
            debug!(status = response.status, "Codex OAuth usage unavailable");
            Err(OAuthMiss {
                status: response.status,
            })
        }
    }
}

async fn validate_api_key(ctx: &FetchContext, key: &str) -> u16 {
    let auth = format!("Bearer {key}");
    ctx.http
        .get(
            MODELS_URL,
            &[
                ("Authorization", auth.as_str()),
                ("Content-Type", "application/json"),
            ],
        )
        .await
        .status
}

/// Fetches Codex usage.
#[instrument(skip(ctx))]
pub async fn fetch_usage(ctx: &FetchContext) -> UsageSnapshot {
    let provider = ProviderKind::Codex;
    let meta = ProviderMetadata::for_provider(provider);

    let Some(credential) = codex_resolver().resolve(ctx).await else {
        return UsageSnapshot::no_credentials(provider);
    };
    let Credential {
        api_key,
        access_token,
        account_id,
        ..
    } = credential;

    let mut oauth_miss = None;
    if let (Some(token), Some(account)) = (access_token.as_deref(), account_id.as_deref()) {
        match fetch_oauth(ctx, token, account).await {
            Ok(snapshot) => return snapshot,
            Err(miss) => oauth_miss = Some(miss),
        }
    }
    let oauth_expired = oauth_miss.is_some_and(|m| m.status == 401);

    let Some(key) = api_key.as_deref() else {
        return match oauth_miss {
            None => UsageSnapshot::no_credentials(provider),
            Some(_) if oauth_expired => {
                UsageSnapshot::failed(provider, Failure::auth_expired("Token expired"))
                    .with_hint(meta.reauth_hint)
            }
            Some(miss) => UsageSnapshot::failed(
                provider,
                Failure::http(miss.status, "Authentication failed"),
            )
            .with_hint(meta.credential_hint),
        };
    };

    let status = validate_api_key(ctx, key).await;
    if status == 200 {
        let mut snapshot = UsageSnapshot::new(provider, SnapshotStatus::Authenticated);
        snapshot.auth = Some(API_KEY_AUTH_LABEL.to_string());
        snapshot.note = Some(API_KEY_NOTE.to_string());
        if oauth_expired {
            snapshot.push_hint(meta.reauth_hint);
        }
        snapshot.push_hint(API_KEY_HINT);
        return snapshot;
    }

    if oauth_expired {
        return UsageSnapshot::failed(provider, Failure::auth_expired("Token expired"))
            .with_hint(meta.reauth_hint);
    }

    warn!(status, "Codex authentication failed");
    UsageSnapshot::failed(provider, Failure::http(status, "Authentication failed"))
        .with_hint(meta.credential_hint)
}
