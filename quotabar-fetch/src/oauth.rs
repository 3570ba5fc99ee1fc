//! OAuth access-token refresh with write-back.
//!
//! A credential that carries both an expiry and a refresh token is checked
//! against the context clock before use. When expired, the refresh token is
//! exchanged once at the token endpoint and the new access token is written
//! back into the document it was read from. Nothing here is fatal: every
//! failure ends in [`RefreshOutcome::Failed`] with the credential untouched.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use quotabar_core::Credential;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::context::FetchContext;
use crate::credentials::{json_i64, json_str};
use crate::error::FetchError;
use crate::host::files::{read_json_file, write_atomic};

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

// ============================================================================
// Client Registration
// ============================================================================

/// OAuth client id and secret of the CLI that issued the token.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientRegistration {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

impl ClientRegistration {
    /// Creates a registration.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ClientRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRegistration")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Discovers the client registration needed for a refresh.
#[async_trait]
pub trait ClientRegistrationSource: Send + Sync {
    /// Returns the registration, or `None` if it cannot be found.
    async fn discover(&self, ctx: &FetchContext) -> Option<ClientRegistration>;
}

// ============================================================================
// Refresh Outcome
// ============================================================================

/// Result of [`TokenRefresher::ensure_fresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Token still valid, or the credential cannot be refreshed.
    NotNeeded,
    /// Token exchanged.
    Refreshed {
        /// Whether the new token reached disk.
        persisted: bool,
    },
    /// Exchange failed; the credential is unchanged.
    Failed {
        /// Why.
        reason: String,
    },
}

impl RefreshOutcome {
    /// Returns true if a new token was obtained.
    pub fn is_refreshed(&self) -> bool {
        matches!(self, Self::Refreshed { .. })
    }
}

// ============================================================================
// Token Refresher
// ============================================================================

/// Exchanges refresh tokens at a token endpoint.
#[derive(Debug, Clone)]
pub struct TokenRefresher {
    token_url: String,
    access_field: &'static str,
    expiry_field: &'static str,
}

impl TokenRefresher {
    /// Creates a refresher writing `access_token` and `expiry_date` back.
    pub fn new(token_url: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            access_field: "access_token",
            expiry_field: "expiry_date",
        }
    }

    /// Refreshes `credential` in place if its access token has expired.
    #[instrument(skip_all, fields(provider = %credential.provider))]
    pub async fn ensure_fresh(
        &self,
        ctx: &FetchContext,
        credential: &mut Credential,
        registration: &dyn ClientRegistrationSource,
    ) -> RefreshOutcome {
        let now = ctx.now();
        if !credential.is_expired_at(now) {
            return RefreshOutcome::NotNeeded;
        }
        let Some(refresh_token) = credential.refresh_token.clone() else {
            return RefreshOutcome::NotNeeded;
        };

        debug!("Access token expired, refreshing");

        let Some(client) = registration.discover(ctx).await else {
            warn!("OAuth client registration not found, cannot refresh");
            return RefreshOutcome::Failed {
                reason: "client registration not found".to_string(),
            };
        };

        let (access_token, expires_at) = match self.exchange(ctx, &client, &refresh_token, now).await
        {
            Ok(exchanged) => exchanged,
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                return RefreshOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        credential.access_token = Some(access_token.clone());
        credential.expires_at = Some(expires_at);
        info!(expires_at = %expires_at, "Access token refreshed");

        let persisted = match &credential.source_path {
            Some(path) => match self.persist(path, &access_token, expires_at).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to persist refreshed token");
                    false
                }
            },
            None => false,
        };

        RefreshOutcome::Refreshed { persisted }
    }

    async fn exchange(
        &self,
        ctx: &FetchContext,
        client: &ClientRegistration,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), FetchError> {
        let response = ctx
            .http
            .post_form(
                &self.token_url,
                &[],
                &[
                    ("client_id", client.client_id.as_str()),
                    ("client_secret", client.client_secret.as_str()),
                    ("refresh_token", refresh_token),
                    ("grant_type", "refresh_token"),
                ],
            )
            .await;

        if !response.is_ok() {
            return Err(FetchError::RefreshRejected(format!(
                "status {}: {}",
                response.status,
                response.excerpt(200)
            )));
        }

        let body = response
            .json_body()
            .ok_or_else(|| FetchError::RefreshRejected("response is not JSON".to_string()))?;
        let access_token = json_str(body, "/access_token")
            .ok_or_else(|| FetchError::RefreshRejected("no access_token in response".to_string()))?;
        let expires_in = json_i64(body, "/expires_in").unwrap_or(DEFAULT_EXPIRES_IN_SECS);

        Ok((access_token, expiry_after(now, expires_in)))
    }

    /// Rewrites the two token fields, keeping every other field and key order.
    async fn persist(
        &self,
        path: &Path,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), FetchError> {
        let mut document = read_json_file(path)?;
        let Value::Object(fields) = &mut document else {
            return Err(FetchError::InvalidDocument(format!(
                "{} is not a JSON object",
                path.display()
            )));
        };

        fields.insert(
            self.access_field.to_string(),
            Value::String(access_token.to_string()),
        );
        fields.insert(
            self.expiry_field.to_string(),
            Value::from(expires_at.timestamp_millis()),
        );

        let bytes = serde_json::to_vec_pretty(&document)?;
        write_atomic(path, &bytes).await
    }
}

/// Adds `expires_in` seconds to `now`, using the default lifetime when the
/// result is not representable.
fn expiry_after(now: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
    ChronoDuration::try_seconds(expires_in)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or_else(|| {
            warn!(expires_in, "Token lifetime out of range, using default");
            now + ChronoDuration::seconds(DEFAULT_EXPIRES_IN_SECS)
        })
}

// ============================================================================
// Tests
// ============================================================================
