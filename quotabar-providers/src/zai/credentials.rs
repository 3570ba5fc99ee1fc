//! Z.AI credential sources.

use quotabar_core::ProviderKind;
use quotabar_fetch::{CredentialResolver, CredentialSource};

/// Builds the Z.AI resolver. The first key found wins.
pub fn zai_resolver() -> CredentialResolver {
    CredentialResolver::new(
        ProviderKind::Zai,
        ["ZAI_API_KEY", "ZAI_KEY", "ZHIPU_API_KEY", "ZHIPUAI_API_KEY"]
            .into_iter()
            .map(CredentialSource::ApiKeyEnv)
            .collect(),
        |credential| credential.api_key.is_some(),
    )
}
