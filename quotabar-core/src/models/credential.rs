//! Resolved credential material.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::provider::ProviderKind;

/// How a provider is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// A static API key.
    ApiKey,
    /// An OAuth access token, possibly with refresh material.
    OAuth,
}

/// Credential material for one provider.
///
/// Built up field by field from an ordered list of sources. Fields that are
/// already set are never overwritten by a later source.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Provider the credential belongs to.
    pub provider: ProviderKind,
    /// API key, if one was found.
    pub api_key: Option<String>,
    /// OAuth access token.
    pub access_token: Option<String>,
    /// OAuth refresh token.
    pub refresh_token: Option<String>,
    /// When the access token expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Account identifier sent alongside the token (Codex).
    pub account_id: Option<String>,
    /// Subscription plan recorded next to the token.
    pub plan: Option<String>,
    /// File the OAuth material was read from.
    pub source_path: Option<PathBuf>,
}

impl Credential {
    /// Creates an empty credential for a provider.
    pub fn empty(provider: ProviderKind) -> Self {
        Self {
            provider,
            api_key: None,
            access_token: None,
            refresh_token: None,
            expires_at: None,
            account_id: None,
            plan: None,
            source_path: None,
        }
    }

    /// Creates an API key credential.
    pub fn api_key(provider: ProviderKind, key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Self::empty(provider)
        }
    }

    /// Creates an OAuth credential with only an access token.
    pub fn access_token(provider: ProviderKind, token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..Self::empty(provider)
        }
    }

    /// Returns the credential kind.
    pub fn kind(&self) -> CredentialKind {
        if self.access_token.is_some() {
            CredentialKind::OAuth
        } else {
            CredentialKind::ApiKey
        }
    }

    /// Returns true if no usable field is set.
    pub fn is_empty(&self) -> bool {
        self.api_key.is_none() && self.access_token.is_none() && self.refresh_token.is_none()
    }

    /// Fills every unset field from `other`.
    ///
    /// `source_path` follows the OAuth material: it is only taken from
    /// `other` when `other` contributed a token.
    pub fn supplement(&mut self, other: Credential) {
        let contributes_oauth = (self.access_token.is_none() && other.access_token.is_some())
            || (self.refresh_token.is_none() && other.refresh_token.is_some());

        fill(&mut self.api_key, other.api_key);
        fill(&mut self.access_token, other.access_token);
        fill(&mut self.refresh_token, other.refresh_token);
        fill(&mut self.expires_at, other.expires_at);
        fill(&mut self.account_id, other.account_id);
        fill(&mut self.plan, other.plan);

        if contributes_oauth {
            fill(&mut self.source_path, other.source_path);
        }
    }

    /// Returns true if the access token has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| now >= expiry)
    }

    /// Returns true if the credential carries refresh material.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some() && self.expires_at.is_some()
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("provider", &self.provider)
            .field("kind", &self.kind())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("account_id", &self.account_id)
            .field("plan", &self.plan)
            .field("source_path", &self.source_path)
            .finish()
    }
}
