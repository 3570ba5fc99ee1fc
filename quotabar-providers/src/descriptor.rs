//! Provider descriptor system.
//!
//! A descriptor is one row of the dispatch table: static metadata plus plain
//! function pointers for credential resolution, fetching and normalization.
//! Providers do not share a trait object; the registry just holds these rows.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use quotabar_core::{Credential, ProviderKind, ProviderMetadata, UsageSnapshot};
use quotabar_fetch::FetchContext;
use tracing::{debug, instrument};

use crate::raw::RawUsage;

/// Resolves the provider's credential.
pub type ResolveFn = for<'a> fn(&'a FetchContext) -> BoxFuture<'a, Option<Credential>>;

/// Runs the full fetch. Never fails; failures are part of the snapshot.
pub type FetchFn = for<'a> fn(&'a FetchContext) -> BoxFuture<'a, UsageSnapshot>;

/// Maps raw payloads to a snapshot. Pure.
pub type NormalizeFn = fn(&RawUsage, DateTime<Utc>) -> UsageSnapshot;

// ============================================================================
// Provider Descriptor
// ============================================================================

/// Complete descriptor for a provider.
pub struct ProviderDescriptor {
    /// Provider identifier.
    pub kind: ProviderKind,
    /// Display metadata and hints.
    pub metadata: ProviderMetadata,
    /// Credential resolution.
    pub resolve: ResolveFn,
    /// Fetch-and-normalize pipeline.
    pub fetch: FetchFn,
    /// Payload normalization.
    pub normalize: NormalizeFn,
}

impl ProviderDescriptor {
    /// Returns the display name.
    pub fn display_name(&self) -> &'static str {
        self.kind.display_name()
    }

    /// Returns the CLI name.
    pub fn cli_name(&self) -> &'static str {
        self.kind.cli_name()
    }

    /// Resolves the provider's credential.
    pub async fn resolve_credential(&self, ctx: &FetchContext) -> Option<Credential> {
        (self.resolve)(ctx).await
    }

    /// Fetches and normalizes usage.
    #[instrument(skip(self, ctx), fields(provider = %self.kind))]
    pub async fn fetch_usage(&self, ctx: &FetchContext) -> UsageSnapshot {
        let snapshot = (self.fetch)(ctx).await;
        debug!(
            status = ?snapshot.status,
            windows = snapshot.windows.len(),
            failure = ?snapshot.failure_kind(),
            "Provider fetch finished"
        );
        snapshot
    }

    /// Normalizes already collected payloads.
    pub fn normalize(&self, raw: &RawUsage, now: DateTime<Utc>) -> UsageSnapshot {
        (self.normalize)(raw, now)
    }
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("kind", &self.kind)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
