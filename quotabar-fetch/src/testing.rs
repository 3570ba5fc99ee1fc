//! Test doubles for host APIs.
//!
//! Available to this crate's tests and, through the `testing` feature, to the
//! tests of downstream crates.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::context::{Clock, FetchContext, FetchSettings, HostEnv};
use crate::error::KeychainError;
use crate::host::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::host::keychain::KeychainApi;
use crate::oauth::{ClientRegistration, ClientRegistrationSource};

/// The instant every test context is pinned to: 2025-01-03T10:00:00Z.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 3, 10, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Builds a context with a scripted transport, fixed home, fixed vars and a
/// fixed clock. Host probing is disabled.
pub fn test_context(
    transport: ScriptedTransport,
    home: &Path,
    vars: &[(&str, &str)],
) -> FetchContext {
    FetchContext::builder()
        .http(Arc::new(transport))
        .keychain(Arc::new(MemoryKeychain::new()))
        .env(HostEnv::fixed(home, vars.iter().copied()))
        .clock(Clock::Fixed(fixed_now()))
        .settings(FetchSettings::default())
        .build()
}

// ============================================================================
// Scripted Transport
// ============================================================================

#[derive(Default)]
struct Script {
    responses: VecDeque<HttpResponse>,
    requests: Vec<HttpRequest>,
}

/// Transport that replays queued responses and records every request.
///
/// Clones share the same script. Once the queue is empty every request gets
/// a transport failure.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    /// Creates a transport with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    #[must_use]
    pub fn respond(self, response: HttpResponse) -> Self {
        self.push(response);
        self
    }

    /// Queues a response on a shared handle.
    pub fn push(&self, response: HttpResponse) {
        self.lock().responses.push_back(response);
    }

    /// Returns every request seen so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    /// Returns the URLs requested so far.
    pub fn urls(&self) -> Vec<String> {
        self.lock().requests.iter().map(|r| r.url.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn request(&self, request: HttpRequest) -> HttpResponse {
        let mut script = self.lock();
        script.requests.push(request);
        script
            .responses
            .pop_front()
            .unwrap_or_else(|| HttpResponse::transport_failure("no scripted response"))
    }
}

// ============================================================================
// Memory Keychain
// ============================================================================

/// In-memory keychain keyed by `(service, account)`.
#[derive(Clone, Default)]
pub struct MemoryKeychain {
    entries: Arc<Mutex<HashMap<(String, String), String>>>,
}

impl MemoryKeychain {
    /// Creates an empty keychain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a secret.
    pub fn insert(&self, service: &str, account: &str, secret: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((service.to_string(), account.to_string()), secret.to_string());
    }
}

#[async_trait]
impl KeychainApi for MemoryKeychain {
    async fn get(&self, service: &str, account: &str) -> Result<Option<String>, KeychainError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(service.to_string(), account.to_string()))
            .cloned())
    }
}

// ============================================================================
// Static Registration
// ============================================================================

/// Registration source returning a fixed answer.
#[derive(Debug, Clone)]
pub struct StaticRegistration(Option<ClientRegistration>);

impl StaticRegistration {
    /// Always finds the given registration.
    pub fn found(client_id: &str, client_secret: &str) -> Self {
        Self(Some(ClientRegistration::new(client_id, client_secret)))
    }

    /// Never finds a registration.
    pub fn missing() -> Self {
        Self(None)
    }
}

#[async_trait]
impl ClientRegistrationSource for StaticRegistration {
    async fn discover(&self, _ctx: &FetchContext) -> Option<ClientRegistration> {
        self.0.clone()
    }
}
