//! Runs the selected providers and assembles the report.

use std::collections::BTreeSet;
use std::time::Duration;

use futures::future::join_all;
use quotabar_core::{ProviderKind, UsageReport};
use quotabar_fetch::FetchContext;
use quotabar_providers::ProviderRegistry;
use tracing::{debug, info, instrument};

use crate::cache::Cache;

/// Whether a fresh cached report may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Always fetch.
    Bypass,
    /// Return the cached report if it is younger than `ttl`.
    UseIfFresh {
        /// Freshness window.
        ttl: Duration,
    },
}

/// What to aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRequest {
    /// Providers to query. Empty means all.
    pub providers: BTreeSet<ProviderKind>,
    /// Cache policy.
    pub cache: CacheMode,
}

impl AggregateRequest {
    /// Requests every provider, bypassing the cache.
    pub fn all() -> Self {
        Self {
            providers: BTreeSet::new(),
            cache: CacheMode::Bypass,
        }
    }

    /// Restricts the request to `providers`.
    #[must_use]
    pub fn with_providers(mut self, providers: impl IntoIterator<Item = ProviderKind>) -> Self {
        self.providers = providers.into_iter().collect();
        self
    }

    /// Sets the cache policy.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }
}

/// Fetches every selected provider concurrently and caches the result.
#[derive(Debug)]
pub struct Aggregator {
    ctx: FetchContext,
    cache: Cache,
}

impl Aggregator {
    /// Creates an aggregator.
    pub fn new(ctx: FetchContext, cache: Cache) -> Self {
        Self { ctx, cache }
    }

    /// Returns the fetch context.
    pub fn context(&self) -> &FetchContext {
        &self.ctx
    }

    /// Produces a report for `request`.
    ///
    /// A cache hit is returned as stored, even when it covers a different set
    /// of providers than the one requested.
    #[instrument(skip(self), fields(providers = request.providers.len()))]
    pub async fn run(&self, request: &AggregateRequest) -> UsageReport {
        let now = self.ctx.now();

        if let CacheMode::UseIfFresh { ttl } = request.cache {
            if let Some(report) = self.cache.get_at(ttl, now).await {
                info!(providers = report.len(), "Using cached report");
                return report;
            }
        }

        let descriptors = ProviderRegistry::select(&request.providers);
        debug!(count = descriptors.len(), "Fetching providers");

        let snapshots = join_all(descriptors.iter().map(|desc| desc.fetch_usage(&self.ctx))).await;
        let report: UsageReport = snapshots.into_iter().collect();

        self.cache.put_at(&report, self.ctx.now()).await;
        report
    }
}
