// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # quotabar Providers
//!
//! Provider-specific implementations for quotabar.
//!
//! Each provider module contains:
//!
//! - **Credentials**: the ordered credential sources and completeness rule
//! - **Fetcher**: HTTP calls, status handling and fallbacks
//! - **Parser**: pure normalization of collected payloads
//! - **Descriptor**: the registry row tying the three together
//!
//! ## Supported Providers
//!
//! | Provider | OAuth | API Key | Refresh | Fallback |
//! |----------|-------|---------|---------|----------|
//! | Claude (Anthropic) | ✅ | ❌ | ❌ | ❌ |
//! | Codex (OpenAI) | ✅ | ✅ | ❌ | models endpoint |
//! | Gemini (Google) | ✅ | ✅ | ✅ | userinfo |
//! | Z.AI | ❌ | ✅ | ❌ | chat auth |
//! | OpenRouter | ❌ | ✅ | ❌ | ❌ |
//!
//! ## Usage
//!
//! ```ignore
//! use quotabar_core::ProviderKind;
//! use quotabar_fetch::FetchContext;
//! use quotabar_providers::ProviderRegistry;
//!
//! let ctx = FetchContext::new();
//! if let Some(desc) = ProviderRegistry::get(ProviderKind::Claude) {
//!     let snapshot = desc.fetch_usage(&ctx).await;
//! }
//! ```

pub mod descriptor;
pub mod error;
pub mod raw;
pub mod registry;

// Provider modules (report order)
pub mod claude;
pub mod codex;
pub mod gemini;
pub mod zai;
pub mod openrouter;

#[cfg(test)]
mod parser_edge_tests;

// Re-export key types
pub use descriptor::{FetchFn, NormalizeFn, ProviderDescriptor, ResolveFn};
pub use error::ProviderError;
pub use raw::RawUsage;
pub use registry::ProviderRegistry;

// Re-export provider descriptors
pub use claude::claude_descriptor;
pub use codex::codex_descriptor;
pub use gemini::gemini_descriptor;
pub use openrouter::openrouter_descriptor;
pub use zai::zai_descriptor;
