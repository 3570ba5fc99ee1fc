//! Gemini usage fetcher.

use quotabar_core::{
    Credential, Failure, ProviderKind, ProviderMetadata, ResetEta, SnapshotStatus, UsageSnapshot,
};
use quotabar_fetch::{FetchContext, RefreshOutcome, TokenRefresher};
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::credentials::gemini_resolver;
use super::gcloud;
use super::parser::{LOAD_ENDPOINT, OAUTH_AUTH_LABEL, QUOTA_ENDPOINT, code_assist_project, normalize};
use super::registration::GeminiCliRegistration;
use crate::raw::RawUsage;

/// Google OAuth token endpoint.
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Code Assist tier and project lookup.
pub const LOAD_CODE_ASSIST_URL: &str = "https://cloudcode-pa.googleapis.com/v1internal:loadCodeAssist";

/// Code Assist quota lookup.
pub const RETRIEVE_QUOTA_URL: &str =
    "https://cloudcode-pa.googleapis.com/v1internal:retrieveUserQuota";

/// Google userinfo endpoint.
pub const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v1/userinfo";

const USERINFO_NOTE: &str = "Quota API failed, token may have limited scopes";
const API_KEY_AUTH_LABEL: &str = "API Key";
const API_KEY_HINT: &str = "API key doesn't support quota API. Check https://aistudio.google.com";

fn expired(meta: &ProviderMetadata, failure: Failure) -> UsageSnapshot {
    UsageSnapshot::failed(meta.kind, failure).with_hint(meta.reauth_hint)
}

/// Runs the Code Assist calls with a valid access token.
async fn fetch_oauth(ctx: &FetchContext, token: &str, meta: &ProviderMetadata) -> UsageSnapshot {
    let auth = format!("Bearer {token}");
    let headers = [
        ("Authorization", auth.as_str()),
        ("Content-Type", "application/json"),
    ];

    let load = ctx
        .http
        .post_json(
            LOAD_CODE_ASSIST_URL,
            &headers,
            json!({
                "metadata": {
                    "ideType": "IDE_UNSPECIFIED",
                    "platform": "PLATFORM_UNSPECIFIED",
                    "pluginType": "GEMINI"
                }
            }),
        )
        .await;

    if let Some(body) = load.ok_json().filter(|v| v.is_object()) {
        let mut raw = RawUsage::new().with(LOAD_ENDPOINT, body.clone());
        let project = code_assist_project(&raw);

        if let Some(project) = project {
            let quota = ctx
                .http
                .post_json(RETRIEVE_QUOTA_URL, &headers, json!({ "project": project }))
                .await;
            match quota.ok_json().filter(|v| v.is_object()) {
                Some(body) => raw.insert(QUOTA_ENDPOINT, body.clone()),
                None => debug!(status = quota.status, "Gemini quota unavailable"),
            }
        } else {
            debug!("No Code Assist project, skipping quota");
        }

        return normalize(&raw, ctx.now());
    }

    if load.status == 401 {
        return expired(meta, Failure::auth_expired("Token expired"));
    }

    debug!(status = load.status, "loadCodeAssist failed, checking token");
    let userinfo = ctx.http.get(USERINFO_URL, &headers).await;
    if let Some(body) = userinfo.ok_json().filter(|v| v.is_object()) {
        let mut snapshot = UsageSnapshot::new(meta.kind, SnapshotStatus::Authenticated);
        snapshot.auth = Some(OAUTH_AUTH_LABEL.to_string());
        snapshot.account = Some(
            body.get("email")
                .and_then(|v| v.as_str())
                .unwrap_or("authenticated")
                .to_string(),
        );
        snapshot.note = Some(USERINFO_NOTE.to_string());
        return snapshot;
    }
    if userinfo.status == 401 {
        return expired(meta, Failure::auth_expired("Token expired"));
    }

    warn!(status = load.status, "Gemini quota request failed");
    UsageSnapshot::failed(
        meta.kind,
        Failure::http(load.status, format!("HTTP {}", load.status)).with_details(load.excerpt(200)),
    )
}

fn api_key_snapshot(provider: ProviderKind) -> UsageSnapshot {
    let mut snapshot = UsageSnapshot::new(provider, SnapshotStatus::Authenticated);
    snapshot.auth = Some(API_KEY_AUTH_LABEL.to_string());
    snapshot.with_hint(API_KEY_HINT)
}

async fn fetch_with_credential(
    ctx: &FetchContext,
    mut credential: Credential,
    meta: &ProviderMetadata,
) -> UsageSnapshot {
    if credential.access_token.is_none() {
        return match credential.api_key {
            Some(_) => api_key_snapshot(meta.kind),
            None => UsageSnapshot::no_credentials(meta.kind),
        };
    }

    let outcome = TokenRefresher::new(TOKEN_URL)
        .ensure_fresh(ctx, &mut credential, &GeminiCliRegistration)
        .await;

    let now = ctx.now();
    if credential.is_expired_at(now) {
        let mut failure = Failure::expired_locally("Token expired");
        if let RefreshOutcome::Failed { reason } = &outcome {
            failure = failure.with_details(reason.clone());
        }
        return expired(meta, failure);
    }

    let Some(token) = credential.access_token.as_deref() else {
        return UsageSnapshot::no_credentials(meta.kind);
    };
    let mut snapshot = fetch_oauth(ctx, token, meta).await;

    if outcome.is_refreshed() {
        snapshot.token_refreshed = Some(true);
    }
    snapshot.token_expires_in = Some(ResetEta::until(credential.expires_at, now))
        .filter(|eta| matches!(eta, ResetEta::In { .. }));
    snapshot
}

/// Fetches Gemini usage.
#[instrument(skip(ctx))]
pub async fn fetch_usage(ctx: &FetchContext) -> UsageSnapshot {
    let provider = ProviderKind::Gemini;
    let meta = ProviderMetadata::for_provider(provider);

    let Some(credential) = gemini_resolver().resolve(ctx).await else {
        return UsageSnapshot::no_credentials(provider);
    };

    let mut snapshot = fetch_with_credential(ctx, credential, &meta).await;

    match gcloud::active_project(ctx).await {
        Ok(project) => snapshot.gcp_project = Some(project),
        Err(e) => debug!(error = %e, "No gcloud project"),
    }
    snapshot
}
