//! End-to-end fetcher tests against a scripted transport.

use std::path::Path;

use chrono::Duration;
use quotabar_core::{FailureKind, ProviderMetadata, ResetEta, SnapshotStatus};
use quotabar_fetch::testing::{ScriptedTransport, fixed_now, test_context};
use quotabar_fetch::{HttpResponse, Method, RequestBody};
use quotabar_providers::{ProviderRegistry, claude, codex, gemini, openrouter, zai};
use serde_json::{Value, json};
use tempfile::TempDir;

fn write_json(home: &Path, relative: &str, value: &Value) {
    let path = home.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn millis_from_now(seconds: i64) -> i64 {
    (fixed_now() + Duration::seconds(seconds)).timestamp_millis()
}

// ============================================================================
// All Providers
// ============================================================================

#[tokio::test]
async fn test_no_credentials_for_every_provider() {
    let home = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    let ctx = test_context(transport.clone(), home.path(), &[]);

    for desc in ProviderRegistry::all() {
        assert!(desc.resolve_credential(&ctx).await.is_none());

        let snapshot = desc.fetch_usage(&ctx).await;
        assert_eq!(snapshot.provider, desc.kind);
        assert_eq!(snapshot.status, SnapshotStatus::Error);
        assert_eq!(snapshot.failure_kind(), Some(FailureKind::NoCredentials));
        assert_eq!(snapshot.hints, vec![desc.metadata.credential_hint.to_string()]);
    }
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_unauthorized_is_auth_expired_with_hint() {
    let home = TempDir::new().unwrap();
    write_json(
        home.path(),
        ".codex/auth.json",
        &json!({"tokens": {"access_token": "x", "account_id": "acct"}}),
    );
    write_json(home.path(), ".gemini/oauth_creds.json", &json!({"access_token": "g"}));
    let vars = [
        ("CLAUDE_ACCESS_TOKEN", "c"),
        ("OPENROUTER_API_KEY", "o"),
        ("ZAI_API_KEY", "z"),
    ];

    for kind in ProviderRegistry::kinds() {
        let transport = ScriptedTransport::new()
            .respond(HttpResponse::json(401, json!({"error": "unauthorized"})))
            .respond(HttpResponse::json(401, json!({"error": "unauthorized"})));
        let ctx = test_context(transport, home.path(), &vars);

        let snapshot = ProviderRegistry::get(kind).unwrap().fetch_usage(&ctx).await;
        let failure = snapshot.failure.as_ref().unwrap();
        assert_eq!(failure.kind, FailureKind::AuthExpired, "{kind}");
        assert_eq!(failure.status, Some(401));
        assert!(
            snapshot
                .hints
                .contains(&ProviderMetadata::for_provider(kind).reauth_hint.to_string())
        );
    }
}

// ============================================================================
// Claude
// ============================================================================

#[tokio::test]
async fn test_claude_usage_with_plan() {
    let home = TempDir::new().unwrap();
    write_json(
        home.path(),
        ".claude/.credentials.json",
        &json!({"claudeAiOauth": {"accessToken": "tok", "subscriptionType": "max"}}),
    );
    let transport = ScriptedTransport::new().respond(HttpResponse::json(
        200,
        json!({
            "five_hour": {"utilization": 42.0, "resets_at": "2025-01-03T12:30:00Z"},
            "seven_day": {"utilization": 10.0, "resets_at": null},
            "seven_day_opus": null
        }),
    ));
    let ctx = test_context(transport.clone(), home.path(), &[]);

    let snapshot = claude::fetch_usage(&ctx).await;
    assert_eq!(snapshot.status, SnapshotStatus::Ok);
    assert_eq!(snapshot.plan.as_deref(), Some("max"));
    assert_eq!(snapshot.window("5h").unwrap().reset_eta, ResetEta::In { seconds: 9000 });
    assert_eq!(snapshot.window("7d").unwrap().reset_eta, ResetEta::NotAvailable);
    assert!(snapshot.window("opus").is_none());

    let request = &transport.requests()[0];
    assert_eq!(request.url, claude::USAGE_URL);
    assert_eq!(request.header_value("authorization"), Some("Bearer tok"));
    assert_eq!(request.header_value("anthropic-beta"), Some("oauth-2025-04-20"));
}

#[tokio::test]
async fn test_claude_server_error_keeps_excerpt() {
    let home = TempDir::new().unwrap();
    let body = "x".repeat(300);
    let transport = ScriptedTransport::new().respond(HttpResponse::text(503, body));
    let ctx = test_context(transport, home.path(), &[("CLAUDE_ACCESS_TOKEN", "tok")]);

    let snapshot = claude::fetch_usage(&ctx).await;
    let failure = snapshot.failure.unwrap();
    assert_eq!(failure.kind, FailureKind::HttpError);
    assert_eq!(failure.status, Some(503));
    assert_eq!(failure.message, "HTTP 503");
    assert_eq!(failure.details.unwrap().len(), 200);
}

#[tokio::test]
async fn test_transport_failure_is_status_zero() {
    let home = TempDir::new().unwrap();
    let ctx = test_context(ScriptedTransport::new(), home.path(), &[("CLAUDE_ACCESS_TOKEN", "tok")]);

    let snapshot = claude::fetch_usage(&ctx).await;
    let failure = snapshot.failure.unwrap();
    assert_eq!(failure.kind, FailureKind::HttpError);
    assert_eq!(failure.status, Some(0));
}

// ============================================================================
// Codex
// ============================================================================

#[tokio::test]
async fn test_codex_oauth_usage() {
    let home = TempDir::new().unwrap();
    write_json(
        home.path(),
        ".codex/auth.json",
        &json!({"tokens": {"access_token": "tok", "account_id": "acct"}}),
    );
    let transport = ScriptedTransport::new().respond(HttpResponse::json(
        200,
        json!({
            "plan_type": "pro",
            "rate_limit": {
                "primary_window": {"used_percent": 30, "limit_window_seconds": 18000, "reset_after_seconds": 600},
                "secondary_window": {"used_percent": 5, "limit_window_seconds": 604800, "reset_after_seconds": 86400}
            }
        }),
    ));
    let ctx = test_context(transport.clone(), home.path(), &[]);

    let snapshot = codex::fetch_usage(&ctx).await;
    assert_eq!(snapshot.status, SnapshotStatus::Ok);
    assert_eq!(snapshot.auth.as_deref(), Some("OAuth (ChatGPT)"));
    assert_eq!(snapshot.plan.as_deref(), Some("pro"));
    assert_eq!(snapshot.window("5h").unwrap().reset_eta.to_string(), "10m");
    assert_eq!(snapshot.window("7d").unwrap().reset_eta.to_string(), "1d 0h");

    let request = &transport.requests()[0];
    assert_eq!(request.header_value("chatgpt-account-id"), Some("acct"));
    assert_eq!(request.header_value("user-agent"), Some("codex-cli"));
}

#[tokio::test]
async fn test_codex_falls_back_to_api_key() {
    let home = TempDir::new().unwrap();
    write_json(
        home.path(),
        ".codex/auth.json",
        &json!({"tokens": {"access_token": "stale", "account_id": "acct"}}),
    );
    let transport = ScriptedTransport::new()
        .respond(HttpResponse::json(401, json!({"detail": "expired"})))
        .respond(HttpResponse::json(200, json!({"data": []})));
    let ctx = test_context(transport.clone(), home.path(), &[("OPENAI_API_KEY", "sk-test")]);

    let snapshot = codex::fetch_usage(&ctx).await;
    assert_eq!(snapshot.status, SnapshotStatus::Authenticated);
    assert_eq!(snapshot.auth.as_deref(), Some("API Key"));
    assert_eq!(
        snapshot.note.as_deref(),
        Some("API key valid but no subscription quota API")
    );
    assert_eq!(
        snapshot.hints,
        vec![
            "Run 'codex login' to re-authenticate".to_string(),
            "Check usage at https://platform.openai.com/usage".to_string(),
        ]
    );
    assert_eq!(transport.urls(), vec![codex::USAGE_URL, codex::MODELS_URL]);
    assert_eq!(
        transport.requests()[1].header_value("authorization"),
        Some("Bearer sk-test")
    );
}

#[tokio::test]
async fn test_codex_oauth_rejected_without_api_key() {
    let home = TempDir::new().unwrap();
    write_json(
        home.path(),
        ".codex/auth.json",
        &json!({"tokens": {"access_token": "stale", "account_id": "acct"}}),
    );
    let transport =
        ScriptedTransport::new().respond(HttpResponse::json(401, json!({"detail": "expired"})));
    let ctx = test_context(transport.clone(), home.path(), &[]);

    let snapshot = codex::fetch_usage(&ctx).await;
    let failure = snapshot.failure.as_ref().unwrap();
    assert_eq!(failure.kind, FailureKind::AuthExpired);
    assert_eq!(failure.status, Some(401));
    assert_eq!(snapshot.hints, vec!["Run 'codex login' to re-authenticate".to_string()]);
    assert_eq!(transport.urls(), vec![codex::USAGE_URL]);
}

#[tokio::test]
async fn test_codex_both_paths_rejected() {
    let home = TempDir::new().unwrap();
    let transport = ScriptedTransport::new().respond(HttpResponse::json(403, json!({})));
    let ctx = test_context(transport, home.path(), &[("OPENAI_API_KEY", "sk-test")]);

    let snapshot = codex::fetch_usage(&ctx).await;
    let failure = snapshot.failure.unwrap();
    assert_eq!(failure.kind, FailureKind::HttpError);
    assert_eq!(failure.status, Some(403));
    assert_eq!(failure.message, "Authentication failed");
    assert_eq!(snapshot.hints, vec!["Run 'codex login' or set OPENAI_API_KEY".to_string()]);
}

#[tokio::test]
async fn test_codex_token_without_account_is_no_credentials() {
    let home = TempDir::new().unwrap();
    write_json(home.path(), ".codex/auth.json", &json!({"tokens": {"access_token": "tok"}}));
    let transport = ScriptedTransport::new();
    let ctx = test_context(transport.clone(), home.path(), &[]);

    let snapshot = codex::fetch_usage(&ctx).await;
    assert_eq!(snapshot.failure_kind(), Some(FailureKind::NoCredentials));
    assert!(transport.requests().is_empty());
}

// ============================================================================
// Gemini
// ============================================================================

#[tokio::test]
async fn test_gemini_tier_and_quota() {
    let home = TempDir::new().unwrap();
    write_json(
        home.path(),
        ".gemini/oauth_creds.json",
        &json!({"access_token": "a", "refresh_token": "r", "expiry_date": millis_from_now(3600)}),
    );
    let transport = ScriptedTransport::new()
        .respond(HttpResponse::json(
            200,
            json!({"currentTier": {"id": "free-tier", "name": "Free"}, "cloudaicompanionProject": "p1"}),
        ))
        .respond(HttpResponse::json(
            200,
            json!({"buckets": [{"modelId": "m1", "remainingFraction": 0.6, "resetTime": "2025-01-03T12:00:00Z"}]}),
        ));
    let ctx = test_context(transport.clone(), home.path(), &[]);

    let snapshot = gemini::fetch_usage(&ctx).await;
    assert_eq!(snapshot.status, SnapshotStatus::Ok);
    assert_eq!(snapshot.tier.as_deref(), Some("Free"));
    assert_eq!(snapshot.auth.as_deref(), Some("OAuth (Google Account)"));
    assert_eq!(snapshot.token_refreshed, None);
    assert_eq!(snapshot.token_expires_in, Some(ResetEta::In { seconds: 3600 }));

    let m1 = snapshot.window("m1").unwrap();
    assert_eq!(m1.used_percent, 40.0);
    assert_eq!(m1.remaining_percent, 60.0);
    assert_eq!(m1.reset_eta, ResetEta::In { seconds: 7200 });

    let requests = transport.requests();
    assert_eq!(transport.urls(), vec![gemini::LOAD_CODE_ASSIST_URL, gemini::RETRIEVE_QUOTA_URL]);
    assert_eq!(
        requests[0].body,
        Some(RequestBody::Json(json!({
            "metadata": {"ideType": "IDE_UNSPECIFIED", "platform": "PLATFORM_UNSPECIFIED", "pluginType": "GEMINI"}
        })))
    );
    assert_eq!(requests[1].body, Some(RequestBody::Json(json!({"project": "p1"}))));
}

#[tokio::test]
async fn test_gemini_refreshes_and_persists() {
    let home = TempDir::new().unwrap();
    write_json(
        home.path(),
        ".gemini/oauth_creds.json",
        &json!({
            "access_token": "old",
            "refresh_token": "r",
            "scope": "openid",
            "expiry_date": millis_from_now(-60)
        }),
    );
    let transport = ScriptedTransport::new()
        .respond(HttpResponse::json(200, json!({"access_token": "new", "expires_in": 1800})))
        .respond(HttpResponse::json(200, json!({"currentTier": {"name": "Standard"}})));
    let ctx = test_context(
        transport.clone(),
        home.path(),
        &[("GEMINI_OAUTH_CLIENT_ID", "cid"), ("GEMINI_OAUTH_CLIENT_SECRET", "cs")],
    );

    let snapshot = gemini::fetch_usage(&ctx).await;
    assert_eq!(snapshot.status, SnapshotStatus::Ok);
    assert_eq!(snapshot.tier.as_deref(), Some("Standard"));
    assert_eq!(snapshot.token_refreshed, Some(true));
    assert_eq!(snapshot.token_expires_in, Some(ResetEta::In { seconds: 1800 }));

    let requests = transport.requests();
    assert_eq!(requests[0].url, gemini::TOKEN_URL);
    assert_eq!(requests[0].method, Method::Post);
    assert!(matches!(&requests[0].body, Some(RequestBody::Form(pairs))
        if pairs.contains(&("client_id".to_string(), "cid".to_string()))
            && pairs.contains(&("grant_type".to_string(), "refresh_token".to_string()))));
    assert_eq!(requests[1].header_value("authorization"), Some("Bearer new"));
    assert_eq!(requests.len(), 2);

    let saved: Value = serde_json::from_str(
        &std::fs::read_to_string(home.path().join(".gemini/oauth_creds.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(saved["access_token"], "new");
    assert_eq!(saved["expiry_date"], millis_from_now(1800));
    assert_eq!(saved["scope"], "openid");
    assert_eq!(saved["refresh_token"], "r");
}

#[tokio::test]
async fn test_gemini_expired_without_client_registration() {
    let home = TempDir::new().unwrap();
    write_json(
        home.path(),
        ".gemini/oauth_creds.json",
        &json!({"access_token": "old", "refresh_token": "r", "expiry_date": millis_from_now(-1)}),
    );
    let transport = ScriptedTransport::new();
    let ctx = test_context(transport.clone(), home.path(), &[]);

    let snapshot = gemini::fetch_usage(&ctx).await;
    assert_eq!(snapshot.failure_kind(), Some(FailureKind::AuthExpired));
    let failure = snapshot.failure.as_ref().unwrap();
    assert_eq!(failure.status, None);
    assert_eq!(failure.details.as_deref(), Some("client registration not found"));
    assert_eq!(snapshot.hints, vec!["Run 'gemini' to refresh token".to_string()]);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_gemini_load_rejected_is_auth_expired() {
    let home = TempDir::new().unwrap();
    write_json(
        home.path(),
        ".gemini/oauth_creds.json",
        &json!({"access_token": "a", "expiry_date": millis_from_now(3600)}),
    );
    let transport =
        ScriptedTransport::new().respond(HttpResponse::json(401, json!({"error": {"code": 401}})));
    let ctx = test_context(transport.clone(), home.path(), &[]);

    let snapshot = gemini::fetch_usage(&ctx).await;
    let failure = snapshot.failure.as_ref().unwrap();
    assert_eq!(failure.kind, FailureKind::AuthExpired);
    assert_eq!(failure.status, Some(401));
    assert_eq!(snapshot.hints, vec!["Run 'gemini' to refresh token".to_string()]);
    assert_eq!(transport.urls(), vec![gemini::LOAD_CODE_ASSIST_URL]);
}

#[tokio::test]
async fn test_gemini_userinfo_fallback() {
    let home = TempDir::new().unwrap();
    write_json(home.path(), ".gemini/oauth_creds.json", &json!({"access_token": "a"}));
    let transport = ScriptedTransport::new()
        .respond(HttpResponse::json(403, json!({"error": {"code": 403}})))
        .respond(HttpResponse::json(200, json!({"email": "dev@example.com"})));
    let ctx = test_context(transport.clone(), home.path(), &[]);

    let snapshot = gemini::fetch_usage(&ctx).await;
    assert_eq!(snapshot.status, SnapshotStatus::Authenticated);
    assert_eq!(snapshot.account.as_deref(), Some("dev@example.com"));
    assert_eq!(
        snapshot.note.as_deref(),
        Some("Quota API failed, token may have limited scopes")
    );
    assert_eq!(transport.urls()[1], gemini::USERINFO_URL);
}

#[tokio::test]
async fn test_gemini_api_key_only() {
    let home = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    let ctx = test_context(transport.clone(), home.path(), &[("GOOGLE_API_KEY", "g")]);

    let snapshot = gemini::fetch_usage(&ctx).await;
    assert_eq!(snapshot.status, SnapshotStatus::Authenticated);
    assert_eq!(snapshot.auth.as_deref(), Some("API Key"));
    assert_eq!(
        snapshot.hints,
        vec!["API key doesn't support quota API. Check https://aistudio.google.com".to_string()]
    );
    assert!(transport.requests().is_empty());
}

// ============================================================================
// Z.AI
// ============================================================================

#[tokio::test]
async fn test_zai_quota_and_history() {
    let home = TempDir::new().unwrap();
    let transport = ScriptedTransport::new()
        .respond(HttpResponse::json(
            200,
            json!({"success": true, "data": {"limits": [
                {"type": "TOKENS_LIMIT", "usage": 100, "currentValue": 60, "remaining": 40, "percentage": 60}
            ]}}),
        ))
        .respond(HttpResponse::json(
            200,
            json!({"success": true, "data": {"totalUsage": {"totalModelCallCount": 7, "totalTokensUsage": 900}}}),
        ));
    let ctx = test_context(transport.clone(), home.path(), &[("ZAI_API_KEY", "zk")]);

    let snapshot = zai::fetch_usage(&ctx).await;
    assert_eq!(snapshot.status, SnapshotStatus::Ok);
    assert_eq!(snapshot.window("tokens").unwrap().used_percent, 60.0);
    assert_eq!(snapshot.weekly_activity.unwrap().calls, 7);
    assert_eq!(snapshot.hints, vec![zai::DASHBOARD_HINT.to_string()]);

    let requests = transport.requests();
    assert_eq!(requests[0].header_value("authorization"), Some("zk"));
    assert!(requests[1].url.starts_with(zai::MODEL_USAGE_URL));
}

#[tokio::test]
async fn test_zai_liveness_fallback() {
    let home = TempDir::new().unwrap();
    let transport = ScriptedTransport::new()
        .respond(HttpResponse::text(500, "boom"))
        .respond(HttpResponse::json(200, json!({"success": false, "msg": "no plan"})))
        .respond(HttpResponse::json(200, json!({"id": "user"})));
    let ctx = test_context(transport.clone(), home.path(), &[("ZAI_KEY", "zk")]);

    let snapshot = zai::fetch_usage(&ctx).await;
    assert_eq!(snapshot.status, SnapshotStatus::Authenticated);
    assert!(snapshot.failure.is_none());
    assert_eq!(snapshot.hints, vec![zai::DASHBOARD_HINT.to_string()]);

    let requests = transport.requests();
    assert_eq!(requests[2].url, zai::LIVENESS_URL);
    assert_eq!(requests[2].header_value("authorization"), Some("Bearer zk"));
}

#[tokio::test]
async fn test_zai_all_calls_fail() {
    let home = TempDir::new().unwrap();
    let transport = ScriptedTransport::new()
        .respond(HttpResponse::text(502, "bad gateway"))
        .respond(HttpResponse::text(502, "bad gateway"))
        .respond(HttpResponse::text(502, "bad gateway"));
    let ctx = test_context(transport, home.path(), &[("ZAI_API_KEY", "zk")]);

    let snapshot = zai::fetch_usage(&ctx).await;
    let failure = snapshot.failure.as_ref().unwrap();
    assert_eq!(failure.kind, FailureKind::HttpError);
    assert_eq!(failure.status, Some(502));
    assert_eq!(snapshot.hints, vec![zai::DASHBOARD_HINT.to_string()]);
}

#[tokio::test]
async fn test_zai_no_credentials_points_to_billing() {
    let home = TempDir::new().unwrap();
    let ctx = test_context(ScriptedTransport::new(), home.path(), &[]);

    let snapshot = zai::fetch_usage(&ctx).await;
    assert_eq!(snapshot.failure_kind(), Some(FailureKind::NoCredentials));
    assert_eq!(snapshot.dashboard_url.as_deref(), Some("https://z.ai/billing"));
}

// ============================================================================
// OpenRouter
// ============================================================================

#[tokio::test]
async fn test_openrouter_balance() {
    let home = TempDir::new().unwrap();
    let transport = ScriptedTransport::new().respond(HttpResponse::json(
        200,
        json!({"data": {"total_credits": 10, "total_usage": 2.5}}),
    ));
    let ctx = test_context(transport.clone(), home.path(), &[("OPENROUTER_KEY", "or")]);

    let snapshot = openrouter::fetch_usage(&ctx).await;
    assert_eq!(snapshot.status, SnapshotStatus::Ok);
    assert_eq!(snapshot.balance.unwrap().balance_usd, 7.5);
    assert_eq!(transport.urls(), vec![openrouter::CREDITS_URL]);
}

#[tokio::test]
async fn test_openrouter_forbidden() {
    let home = TempDir::new().unwrap();
    let transport = ScriptedTransport::new().respond(HttpResponse::json(403, json!({})));
    let ctx = test_context(transport, home.path(), &[("OPENROUTER_API_KEY", "or")]);

    let snapshot = openrouter::fetch_usage(&ctx).await;
    let failure = snapshot.failure.as_ref().unwrap();
    assert_eq!(failure.kind, FailureKind::HttpError);
    assert_eq!(failure.message, "Forbidden");
    assert_eq!(snapshot.hints, vec!["Account may be suspended".to_string()]);
}

#[tokio::test]
async fn test_openrouter_other_status() {
    let home = TempDir::new().unwrap();
    let transport = ScriptedTransport::new().respond(HttpResponse::text(429, "slow down"));
    let ctx = test_context(transport, home.path(), &[("OPENROUTER_API_KEY", "or")]);

    let snapshot = openrouter::fetch_usage(&ctx).await;
    let failure = snapshot.failure.unwrap();
    assert_eq!(failure.message, "API error (429)");
    assert_eq!(failure.details.as_deref(), Some("slow down"));
}
