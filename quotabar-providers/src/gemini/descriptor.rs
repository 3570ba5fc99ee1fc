//! Gemini provider descriptor.

use futures::future::BoxFuture;
use quotabar_core::{Credential, ProviderKind, ProviderMetadata, UsageSnapshot};
use quotabar_fetch::FetchContext;

use super::credentials::gemini_resolver;
use super::fetcher::fetch_usage;
use super::parser::normalize;
use crate::descriptor::ProviderDescriptor;

fn resolve(ctx: &FetchContext) -> BoxFuture<'_, Option<Credential>> {
    Box::pin(async move { gemini_resolver().resolve(ctx).await })
}

fn fetch(ctx: &FetchContext) -> BoxFuture<'_, UsageSnapshot> {
    Box::pin(fetch_usage(ctx))
}

/// Creates the Gemini descriptor.
pub fn gemini_descriptor() -> ProviderDescriptor {
    ProviderDescriptor {
        kind: ProviderKind::Gemini,
        metadata: ProviderMetadata::for_provider(ProviderKind::Gemini),
        resolve,
        fetch,
        normalize,
    }
}
