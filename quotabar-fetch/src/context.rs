//! Fetch context providing access to host APIs.
//!
//! The fetch context is passed to every resolver and fetcher. It bundles the
//! transport, keychain, process runner, environment view and clock, so tests
//! can swap any of them without touching process-wide state.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::host::{
    blocking::UreqTransport,
    http::{DEFAULT_TIMEOUT, HttpTransport, ReqwestTransport},
    keychain::{KeychainApi, SystemKeychain},
    process::ProcessRunner,
};

// ============================================================================
// Transport Kind
// ============================================================================

/// Which HTTP transport implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Async `reqwest` client.
    #[default]
    Reqwest,
    /// Minimal blocking `ureq` client.
    Ureq,
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reqwest" => Ok(Self::Reqwest),
            "ureq" => Ok(Self::Ureq),
            other => Err(format!("unknown transport '{other}' (expected reqwest or ureq)")),
        }
    }
}

/// Builds the transport selected by `settings`.
///
/// Falls back to the blocking client when the async client cannot be built.
pub fn transport_for(settings: &FetchSettings) -> Arc<dyn HttpTransport> {
    match settings.transport {
        TransportKind::Reqwest => match ReqwestTransport::new(settings.timeout) {
            Ok(transport) => Arc::new(transport),
            Err(e) => {
                warn!(error = %e, "Async HTTP client unavailable, using blocking client");
                Arc::new(UreqTransport::new(settings.timeout))
            }
        },
        TransportKind::Ureq => Arc::new(UreqTransport::new(settings.timeout)),
    }
}

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for fetch operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Transport implementation.
    pub transport: TransportKind,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            transport: TransportKind::default(),
        }
    }
}

impl FetchSettings {
    /// Returns settings with a custom timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns settings with a different transport.
    #[must_use]
    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Source of the current time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    /// Wall clock, in UTC.
    #[default]
    System,
    /// A fixed instant.
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns the current time.
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Fixed(instant) => *instant,
        }
    }
}

// ============================================================================
// Host Environment
// ============================================================================

/// Read-only view of environment variables and the home directory.
#[derive(Clone)]
pub struct HostEnv {
    home: Option<PathBuf>,
    vars: Option<HashMap<String, String>>,
    probe_system: bool,
}

impl HostEnv {
    /// The real process environment.
    pub fn system() -> Self {
        Self {
            home: dirs::home_dir(),
            vars: None,
            probe_system: true,
        }
    }

    /// A fixed environment rooted at `home`.
    ///
    /// Subprocess probes and absolute system paths are disabled.
    pub fn fixed<I, K, V>(home: impl Into<PathBuf>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            home: Some(home.into()),
            vars: Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
            probe_system: false,
        }
    }

    /// Returns a non-empty environment variable.
    pub fn var(&self, name: &str) -> Option<String> {
        let value = match &self.vars {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        };
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Returns the home directory.
    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Returns a path relative to the home directory.
    pub fn home_path(&self, relative: &str) -> Option<PathBuf> {
        self.home.as_ref().map(|home| home.join(relative))
    }

    /// Returns true if subprocesses and system-wide paths may be probed.
    pub fn probe_system(&self) -> bool {
        self.probe_system
    }
}

impl fmt::Debug for HostEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostEnv")
            .field("home", &self.home)
            .field("fixed_vars", &self.vars.as_ref().map(HashMap::len))
            .field("probe_system", &self.probe_system)
            .finish()
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Context provided to resolvers and fetchers, giving access to host APIs.
pub struct FetchContext {
    /// HTTP transport.
    pub http: Arc<dyn HttpTransport>,
    /// Keychain reader.
    pub keychain: Arc<dyn KeychainApi>,
    /// Process runner for companion CLIs.
    pub process: Arc<ProcessRunner>,
    /// Environment variables and home directory.
    pub env: HostEnv,
    /// Time source.
    pub clock: Clock,
    /// Fetch settings.
    pub settings: FetchSettings,
}

impl FetchContext {
    /// Creates a new fetch context with default host API implementations.
    pub fn new() -> Self {
        Self::with_settings(FetchSettings::default())
    }

    /// Creates a context with custom settings.
    pub fn with_settings(settings: FetchSettings) -> Self {
        Self::builder().settings(settings).build()
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// Returns the current time from the context clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Returns the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}

impl Default for FetchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchContext")
            .field("http", &self.http.name())
            .field("env", &self.env)
            .field("clock", &self.clock)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a `FetchContext`.
#[derive(Default)]
pub struct FetchContextBuilder {
    http: Option<Arc<dyn HttpTransport>>,
    keychain: Option<Arc<dyn KeychainApi>>,
    process: Option<Arc<ProcessRunner>>,
    env: Option<HostEnv>,
    clock: Clock,
    settings: FetchSettings,
}

impl FetchContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP transport.
    #[must_use]
    pub fn http(mut self, http: Arc<dyn HttpTransport>) -> Self {
        self.http = Some(http);
        self
    }

    /// Sets the keychain implementation.
    #[must_use]
    pub fn keychain(mut self, keychain: Arc<dyn KeychainApi>) -> Self {
        self.keychain = Some(keychain);
        self
    }

    /// Sets the process runner.
    #[must_use]
    pub fn process(mut self, process: Arc<ProcessRunner>) -> Self {
        self.process = Some(process);
        self
    }

    /// Sets the environment view.
    #[must_use]
    pub fn env(mut self, env: HostEnv) -> Self {
        self.env = Some(env);
        self
    }

    /// Sets the clock.
    #[must_use]
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the fetch settings.
    #[must_use]
    pub fn settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Builds the fetch context.
    pub fn build(self) -> FetchContext {
        let http = self.http.unwrap_or_else(|| transport_for(&self.settings));
        FetchContext {
            http,
            keychain: self.keychain.unwrap_or_else(|| Arc::new(SystemKeychain::new())),
            process: self.process.unwrap_or_else(|| Arc::new(ProcessRunner::new())),
            env: self.env.unwrap_or_else(HostEnv::system),
            clock: self.clock,
            settings: self.settings,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
