// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # quotabar Fetch
//!
//! Host APIs, credential resolution and token refresh for `quotabar`.
//!
//! ## Host APIs
//!
//! The [`host`] module provides abstractions for system interactions:
//!
//! - [`host::http`] - Uniform GET/POST transport with the async `reqwest` client
//! - [`host::blocking`] - The same transport on a blocking `ureq` client
//! - [`host::keychain`] - Read access to the system keychain
//! - [`host::process`] - Subprocess execution for companion CLIs
//! - [`host::files`] - Atomic writes shared by the cache and token write-back
//!
//! ## Credentials
//!
//! - [`credentials::CredentialResolver`] - Probes an ordered list of sources
//! - [`oauth::TokenRefresher`] - Refreshes expired OAuth tokens and persists them
//! - [`context::FetchContext`] - Transport, keychain, environment and clock
//!
//! ## Example
//!
//! ```ignore
//! use quotabar_fetch::{CredentialResolver, CredentialSource, FetchContext};
//!
//! let ctx = FetchContext::new();
//! let resolver = CredentialResolver::new(
//!     ProviderKind::OpenRouter,
//!     vec![CredentialSource::ApiKeyEnv("OPENROUTER_API_KEY")],
//!     |c| c.api_key.is_some(),
//! );
//! let credential = resolver.resolve(&ctx).await;
//! ```

pub mod context;
pub mod credentials;
pub mod error;
pub mod host;
pub mod oauth;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export key types at crate root

// Errors
pub use error::{FetchError, HttpError, KeychainError, ProcessError};

// Host APIs
pub use host::{
    blocking::UreqTransport,
    files::{read_json_file, write_atomic},
    http::{
        HttpRequest, HttpResponse, HttpTransport, Method, RequestBody, ReqwestTransport, ResponseBody,
        USER_AGENT,
    },
    keychain::{KeychainApi, SystemKeychain},
    process::{ProcessOutput, ProcessRunner},
};

// Context & credentials
pub use context::{Clock, FetchContext, FetchContextBuilder, FetchSettings, HostEnv, TransportKind, transport_for};
pub use credentials::{CredentialResolver, CredentialSource, Extractor, json_f64, json_i64, json_str};
pub use oauth::{ClientRegistration, ClientRegistrationSource, RefreshOutcome, TokenRefresher};
