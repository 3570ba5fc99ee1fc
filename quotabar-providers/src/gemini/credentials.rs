//! Gemini credential sources.

use quotabar_core::{Credential, ProviderKind, reset_from_epoch_millis};
use quotabar_fetch::{CredentialResolver, CredentialSource, json_i64, json_str};
use serde_json::Value;

fn extract_oauth_creds(document: &Value, provider: ProviderKind) -> Option<Credential> {
    Some(Credential {
        access_token: json_str(document, "/access_token"),
        refresh_token: json_str(document, "/refresh_token"),
        expires_at: json_i64(document, "/expiry_date").and_then(reset_from_epoch_millis),
        ..Credential::empty(provider)
    })
}

fn is_complete(credential: &Credential) -> bool {
    credential.api_key.is_some() && credential.access_token.is_some()
}

/// Builds the Gemini resolver.
pub fn gemini_resolver() -> CredentialResolver {
    CredentialResolver::new(
        ProviderKind::Gemini,
        vec![
            CredentialSource::ApiKeyEnv("GEMINI_API_KEY"),
            CredentialSource::ApiKeyEnv("GOOGLE_API_KEY"),
            CredentialSource::JsonFile {
                relative: ".gemini/oauth_creds.json",
                extract: extract_oauth_creds,
            },
            CredentialSource::JsonFile {
                relative: ".config/gemini/oauth_creds.json",
                extract: extract_oauth_creds,
            },
        ],
        is_complete,
    )
}
