//! Ordered-source credential discovery.
//!
//! Each provider declares a fixed list of [`CredentialSource`]s. The
//! [`CredentialResolver`] probes them in order: the first source that yields
//! material wins, later sources only fill fields that are still empty, and
//! probing stops once the provider's completeness predicate holds.
//!
//! Resolution never writes anything and never fails. A missing file, a corrupt
//! document or a keychain miss is logged at `debug` and the next source is
//! tried.

use std::path::Path;

use quotabar_core::{Credential, ProviderKind};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::context::FetchContext;
use crate::error::FetchError;
use crate::host::files::read_json_file;

/// Maps a parsed document to a credential fragment.
pub type Extractor = fn(&Value, ProviderKind) -> Option<Credential>;

// ============================================================================
// Credential Source
// ============================================================================

/// A single place where credential material may live.
#[derive(Debug, Clone, Copy)]
pub enum CredentialSource {
    /// API key in an environment variable.
    ApiKeyEnv(&'static str),
    /// OAuth access token in an environment variable.
    AccessTokenEnv(&'static str),
    /// JSON document relative to the home directory.
    JsonFile {
        /// Path relative to `$HOME`.
        relative: &'static str,
        /// Field extraction.
        extract: Extractor,
    },
    /// JSON document stored in the system keychain.
    Keychain {
        /// Keychain service name.
        service: &'static str,
        /// Field extraction.
        extract: Extractor,
    },
}

impl CredentialSource {
    /// Short description used in logs.
    pub fn describe(&self) -> String {
        match self {
            Self::ApiKeyEnv(var) | Self::AccessTokenEnv(var) => format!("env:{var}"),
            Self::JsonFile { relative, .. } => format!("file:~/{relative}"),
            Self::Keychain { service, .. } => format!("keychain:{service}"),
        }
    }

    /// Probes this source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source exists but could not be read or parsed.
    pub async fn probe(
        &self,
        provider: ProviderKind,
        ctx: &FetchContext,
    ) -> Result<Option<Credential>, FetchError> {
        match self {
            Self::ApiKeyEnv(var) => Ok(ctx.env.var(var).map(|key| Credential::api_key(provider, key))),
            Self::AccessTokenEnv(var) => Ok(ctx
                .env
                .var(var)
                .map(|token| Credential::access_token(provider, token))),
            Self::JsonFile { relative, extract } => {
                let Some(path) = ctx.env.home_path(relative) else {
                    return Ok(None);
                };
                probe_file(&path, provider, *extract)
            }
            Self::Keychain { service, extract } => {
                probe_keychain(service, provider, *extract, ctx).await
            }
        }
    }
}

fn probe_file(
    path: &Path,
    provider: ProviderKind,
    extract: Extractor,
) -> Result<Option<Credential>, FetchError> {
    if !path.exists() {
        return Ok(None);
    }
    let document = read_json_file(path)?;
    Ok(extract(&document, provider)
        .filter(|fragment| !fragment.is_empty())
        .map(|mut fragment| {
            fragment.source_path = Some(path.to_path_buf());
            fragment
        }))
}

async fn probe_keychain(
    service: &str,
    provider: ProviderKind,
    extract: Extractor,
    ctx: &FetchContext,
) -> Result<Option<Credential>, FetchError> {
    let mut accounts = Vec::with_capacity(2);
    if let Some(user) = ctx.env.var("USER") {
        accounts.push(user);
    }
    accounts.push(String::new());

    for account in &accounts {
        let Some(secret) = ctx.keychain.get(service, account).await? else {
            continue;
        };
        let document: Value = serde_json::from_str(&secret)
            .map_err(|_| FetchError::InvalidDocument(format!("keychain entry {service}")))?;
        if let Some(fragment) = extract(&document, provider).filter(|f| !f.is_empty()) {
            return Ok(Some(fragment));
        }
    }
    Ok(None)
}

// ============================================================================
// Resolver
// ============================================================================

/// Per-provider resolver over an ordered source list.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    provider: ProviderKind,
    sources: Vec<CredentialSource>,
    is_complete: fn(&Credential) -> bool,
}

impl CredentialResolver {
    /// Creates a resolver.
    pub fn new(
        provider: ProviderKind,
        sources: Vec<CredentialSource>,
        is_complete: fn(&Credential) -> bool,
    ) -> Self {
        Self {
            provider,
            sources,
            is_complete,
        }
    }

    /// Returns the source list.
    pub fn sources(&self) -> &[CredentialSource] {
        &self.sources
    }

    /// Resolves the credential, or `None` when no source has usable material.
    #[instrument(skip(self, ctx), fields(provider = %self.provider))]
    pub async fn resolve(&self, ctx: &FetchContext) -> Option<Credential> {
        let mut found: Option<Credential> = None;

        for source in &self.sources {
            if found.as_ref().is_some_and(|c| (self.is_complete)(c)) {
                break;
            }

            match source.probe(self.provider, ctx).await {
                Ok(Some(fragment)) => {
                    debug!(source = %source.describe(), "Credential material found");
                    match found.as_mut() {
                        Some(credential) => credential.supplement(fragment),
                        None => found = Some(fragment),
                    }
                }
                Ok(None) => debug!(source = %source.describe(), "Source empty"),
                Err(e) => debug!(source = %source.describe(), error = %e, "Source unreadable"),
            }
        }

        if found.is_none() {
            debug!("No credentials found");
        }
        found
    }
}

// ============================================================================
// JSON Helpers
// ============================================================================

/// Returns a non-empty string at a JSON pointer.
pub fn json_str(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Returns an integer at a JSON pointer, accepting numbers and numeric strings.
#[allow(clippy::cast_possible_truncation)]
pub fn json_i64(value: &Value, pointer: &str) -> Option<i64> {
    match value.pointer(pointer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }
}

/// Returns a float at a JSON pointer, accepting numbers and numeric strings.
pub fn json_f64(value: &Value, pointer: &str) -> Option<f64> {
    match value.pointer(pointer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryKeychain, ScriptedTransport, test_context};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn token_file(value: &Value, provider: ProviderKind) -> Option<Credential> {
        Some(Credential {
            access_token: json_str(value, "/access_token"),
            refresh_token: json_str(value, "/refresh_token"),
            account_id: json_str(value, "/account_id"),
            ..Credential::empty(provider)
        })
    }

    fn has_token_and_key(c: &Credential) -> bool {
        c.access_token.is_some() && c.api_key.is_some()
    }

    fn resolver() -> CredentialResolver {
        CredentialResolver::new(
            ProviderKind::Codex,
            vec![
                CredentialSource::ApiKeyEnv("TEST_KEY"),
                CredentialSource::JsonFile {
                    relative: ".tool/first.json",
                    extract: token_file,
                },
                CredentialSource::JsonFile {
                    relative: ".tool/second.json",
                    extract: token_file,
                },
            ],
            has_token_and_key,
        )
    }

    fn write(dir: &TempDir, relative: &str, content: &str) {
        let path = dir.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let home = TempDir::new().unwrap();
        let ctx = test_context(ScriptedTransport::new(), home.path(), &[]);
        assert!(resolver().resolve(&ctx).await.is_none());
    }

    #[tokio::test]
    async fn test_later_sources_supplement_but_never_overwrite() {
        let home = TempDir::new().unwrap();
        write(&home, ".tool/first.json", r#"{"access_token": "first"}"#);
        write(
            &home,
            ".tool/second.json",
            r#"{"access_token": "second", "account_id": "acct"}"#,
        );
        let ctx = test_context(ScriptedTransport::new(), home.path(), &[]);

        let credential = resolver().resolve(&ctx).await.unwrap();
        assert_eq!(credential.access_token.as_deref(), Some("first"));
        assert_eq!(credential.account_id.as_deref(), Some("acct"));
        assert_eq!(
            credential.source_path,
            Some(home.path().join(".tool/first.json"))
        );
    }

    #[tokio::test]
    async fn test_stops_when_complete() {
        let home = TempDir::new().unwrap();
        write(&home, ".tool/first.json", r#"{"access_token": "first"}"#);
        write(&home, ".tool/second.json", r#"{"account_id": "never-read"}"#);
        let ctx = test_context(ScriptedTransport::new(), home.path(), &[("TEST_KEY", "key")]);

        let credential = resolver().resolve(&ctx).await.unwrap();
        assert_eq!(credential.api_key.as_deref(), Some("key"));
        assert_eq!(credential.access_token.as_deref(), Some("first"));
        assert_eq!(credential.account_id, None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_skipped() {
        let home = TempDir::new().unwrap();
        write(&home, ".tool/first.json", "{not json");
        write(&home, ".tool/second.json", r#"{"access_token": "second"}"#);
        let ctx = test_context(ScriptedTransport::new(), home.path(), &[]);

        let credential = resolver().resolve(&ctx).await.unwrap();
        assert_eq!(credential.access_token.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_empty_strings_are_absent() {
        let home = TempDir::new().unwrap();
        write(&home, ".tool/first.json", r#"{"access_token": ""}"#);
        let ctx = test_context(ScriptedTransport::new(), home.path(), &[("TEST_KEY", "")]);
        assert!(resolver().resolve(&ctx).await.is_none());
    }

    #[tokio::test]
    async fn test_keychain_source_tries_user_then_blank_account() {
        let home = TempDir::new().unwrap();
        let keychain = MemoryKeychain::new();
        keychain.insert("svc", "", r#"{"access_token": "from-keychain"}"#);

        let mut ctx = test_context(ScriptedTransport::new(), home.path(), &[("USER", "alice")]);
        ctx.keychain = Arc::new(keychain);

        let source = CredentialSource::Keychain {
            service: "svc",
            extract: token_file,
        };
        let credential = source.probe(ProviderKind::Claude, &ctx).await.unwrap().unwrap();
        assert_eq!(credential.access_token.as_deref(), Some("from-keychain"));
        assert_eq!(credential.source_path, None);
    }

    #[test]
    fn test_lenient_numbers() {
        let doc = json!({"a": 1_700_000_000_000_i64, "b": "1700000000000", "c": 2.5, "d": "x"});
        assert_eq!(json_i64(&doc, "/a"), Some(1_700_000_000_000));
        assert_eq!(json_i64(&doc, "/b"), Some(1_700_000_000_000));
        assert_eq!(json_i64(&doc, "/c"), Some(2));
        assert_eq!(json_i64(&doc, "/d"), None);
        assert_eq!(json_f64(&doc, "/c"), Some(2.5));
        assert_eq!(json_str(&doc, "/missing"), None);
    }
}
