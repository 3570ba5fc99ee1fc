//! OpenRouter credential sources.

use quotabar_core::ProviderKind;
use quotabar_fetch::{CredentialResolver, CredentialSource};

/// Builds the OpenRouter resolver.
pub fn openrouter_resolver() -> CredentialResolver {
    CredentialResolver::new(
        ProviderKind::OpenRouter,
        vec![
            CredentialSource::ApiKeyEnv("OPENROUTER_API_KEY"),
            CredentialSource::ApiKeyEnv("OPENROUTER_KEY"),
        ],
        |credential| credential.api_key.is_some(),
    )
}
