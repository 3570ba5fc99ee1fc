//! Claude credential sources.

use quotabar_core::{Credential, ProviderKind};
use quotabar_fetch::{CredentialResolver, CredentialSource};
use serde::Deserialize;
use serde_json::Value;

/// Keychain service name used by Claude Code.
pub const KEYCHAIN_SERVICE: &str = "Claude Code-credentials";

/// Root structure of `.credentials.json`.
///
/// Older installs store the token fields at the top level.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsFile {
    #[serde(default)]
    claude_ai_oauth: Option<OAuthData>,
    #[serde(flatten)]
    legacy: OAuthData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OAuthData {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    subscription_type: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn extract_oauth(document: &Value, provider: ProviderKind) -> Option<Credential> {
    let file = CredentialsFile::deserialize(document).ok()?;
    let oauth = file.claude_ai_oauth.unwrap_or(file.legacy);
    Some(Credential {
        access_token: non_empty(oauth.access_token),
        plan: non_empty(oauth.subscription_type),
        ..Credential::empty(provider)
    })
}

/// Builds the Claude resolver.
pub fn claude_resolver() -> CredentialResolver {
    let mut sources = Vec::with_capacity(5);
    if cfg!(target_os = "macos") {
        sources.push(CredentialSource::Keychain {
            service: KEYCHAIN_SERVICE,
            extract: extract_oauth,
        });
    }
    sources.extend([
        CredentialSource::JsonFile {
            relative: ".claude/.credentials.json",
            extract: extract_oauth,
        },
        CredentialSource::JsonFile {
            relative: ".claude/credentials.json",
            extract: extract_oauth,
        },
        CredentialSource::JsonFile {
            relative: ".config/claude/credentials.json",
            extract: extract_oauth,
        },
        CredentialSource::AccessTokenEnv("CLAUDE_ACCESS_TOKEN"),
    ]);

    CredentialResolver::new(ProviderKind::Claude, sources, |c| c.access_token.is_some())
}
