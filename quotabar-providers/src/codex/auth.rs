//! Codex credential sources.

use quotabar_core::{Credential, ProviderKind};
use quotabar_fetch::{CredentialResolver, CredentialSource};
use serde::Deserialize;
use serde_json::Value;

/// Root structure of `auth.json`.
#[derive(Debug, Deserialize)]
struct AuthFile {
    #[serde(rename = "OPENAI_API_KEY", default)]
    api_key: Option<String>,
    #[serde(default)]
    tokens: Option<TokenContainer>,
}

#[derive(Debug, Deserialize)]
struct TokenContainer {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    account_id: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn extract_auth(document: &Value, provider: ProviderKind) -> Option<Credential> {
    let file = AuthFile::deserialize(document).ok()?;
    let (access_token, account_id) = file
        .tokens
        .map(|t| (non_empty(t.access_token), non_empty(t.account_id)))
        .unwrap_or_default();
    Some(Credential {
        api_key: non_empty(file.api_key),
        access_token,
        account_id,
        ..Credential::empty(provider)
    })
}

fn is_complete(credential: &Credential) -> bool {
    credential.api_key.is_some()
        && credential.access_token.is_some()
        && credential.account_id.is_some()
}

/// Builds the Codex resolver.
pub fn codex_resolver() -> CredentialResolver {
    CredentialResolver::new(
        ProviderKind::Codex,
        vec![
            CredentialSource::ApiKeyEnv("OPENAI_API_KEY"),
            CredentialSource::JsonFile {
                relative: ".codex/auth.json",
                extract: extract_auth,
            },
            CredentialSource::JsonFile {
                relative: ".config/codex/auth.json",
                extract: extract_auth,
            },
        ],
        is_complete,
    )
}
