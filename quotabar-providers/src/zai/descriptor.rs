//! Z.AI provider descriptor.

use futures::future::BoxFuture;
use quotabar_core::{Credential, ProviderKind, ProviderMetadata, UsageSnapshot};
use quotabar_fetch::FetchContext;

use super::credentials::zai_resolver;
use super::fetcher::fetch_usage;
use super::parser::normalize;
use crate::descriptor::ProviderDescriptor;

fn resolve(ctx: &FetchContext) -> BoxFuture<'_, Option<Credential>> {
    Box::pin(async move { zai_resolver().resolve(ctx).await })
}

fn fetch(ctx: &FetchContext) -> BoxFuture<'_, UsageSnapshot> {
    Box::pin(fetch_usage(ctx))
}

/// Creates the Z.AI descriptor.
pub fn zai_descriptor() -> ProviderDescriptor {
    ProviderDescriptor {
        kind: ProviderKind::Zai,
        metadata: ProviderMetadata::for_provider(ProviderKind::Zai),
        resolve,
        fetch,
        normalize,
    }
}
