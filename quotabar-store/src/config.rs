//! Configuration management.
//!
//! The configuration is loaded once per run: defaults, then an optional JSON
//! file, then command-line overrides applied by the binary. Everything below
//! it receives the derived settings explicitly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use quotabar_core::ProviderKind;
use quotabar_fetch::{FetchSettings, TransportKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{cache_file, default_cache_dir, default_config_path};

/// Default freshness window for cached reports.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Default per-request HTTP timeout.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Upper bound accepted for the HTTP timeout.
const MAX_HTTP_TIMEOUT_SECS: u64 = 300;

// ============================================================================
// Config
// ============================================================================

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the report cache. Platform cache dir when unset.
    pub cache_dir: Option<PathBuf>,
    /// Seconds a cached report stays fresh.
    pub cache_ttl_secs: u64,
    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,
    /// HTTP transport implementation.
    pub transport: TransportKind,
    /// Providers to query. Empty means all.
    pub providers: Vec<ProviderKind>,
    /// Status thresholds for rendering.
    pub thresholds: Thresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            transport: TransportKind::default(),
            providers: Vec::new(),
            thresholds: Thresholds::default(),
        }
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Loads configuration from the default path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path())
    }

    /// Loads configuration from a specific path.
    ///
    /// A missing file yields the defaults. The loaded value is validated.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Config` if the file exists but cannot be read or
    /// is not a valid configuration document.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| StoreError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| StoreError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config.validate())
    }

    /// Clamps out-of-range values.
    ///
    /// - A zero HTTP timeout falls back to the default; large ones are capped.
    /// - Percent thresholds are forced into ascending order within 0..=100.
    /// - Balance thresholds are forced into descending order, never negative.
    /// - Duplicate providers are dropped.
    #[must_use]
    pub fn validate(mut self) -> Self {
        if self.http_timeout_secs == 0 {
            warn!("http_timeout_secs of 0 is invalid, using default");
            self.http_timeout_secs = DEFAULT_HTTP_TIMEOUT_SECS;
        } else if self.http_timeout_secs > MAX_HTTP_TIMEOUT_SECS {
            warn!(value = self.http_timeout_secs, "http_timeout_secs too large, capping");
            self.http_timeout_secs = MAX_HTTP_TIMEOUT_SECS;
        }

        let mut seen = Vec::with_capacity(self.providers.len());
        self.providers.retain(|kind| {
            if seen.contains(kind) {
                false
            } else {
                seen.push(*kind);
                true
            }
        });

        self.thresholds = self.thresholds.clamped();
        self
    }

    /// Derives the fetch settings.
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings::default()
            .with_timeout(Duration::from_secs(self.http_timeout_secs))
            .with_transport(self.transport)
    }

    /// Derives the cache settings.
    pub fn cache_settings(&self) -> CacheSettings {
        let dir = self.cache_dir.clone().unwrap_or_else(default_cache_dir);
        CacheSettings {
            path: cache_file(&dir),
            ttl: Duration::from_secs(self.cache_ttl_secs),
        }
    }
}

/// Where the report cache lives and how long entries stay fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Cache document path.
    pub path: PathBuf,
    /// Freshness window.
    pub ttl: Duration,
}

// ============================================================================
// Thresholds
// ============================================================================

/// Severity of a usage figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Comfortably within limits.
    Ok,
    /// Getting close.
    Warning,
    /// Nearly exhausted.
    Critical,
    /// Exhausted.
    Exhausted,
}

/// Percent-used and balance thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Used percent at which a window turns to warning.
    pub warning_percent: f64,
    /// Used percent at which a window turns critical.
    pub critical_percent: f64,
    /// Used percent at which a window counts as exhausted.
    pub exhausted_percent: f64,
    /// Balance (USD) below which an account turns to warning.
    pub warning_balance: f64,
    /// Balance (USD) below which an account turns critical.
    pub critical_balance: f64,
    /// Balance (USD) at or below which an account counts as exhausted.
    pub exhausted_balance: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning_percent: 70.0,
            critical_percent: 90.0,
            exhausted_percent: 100.0,
            warning_balance: 5.0,
            critical_balance: 1.0,
            exhausted_balance: 0.0,
        }
    }
}

impl Thresholds {
    /// Classifies a used percentage.
    pub fn level_for_percent(&self, used_percent: f64) -> Level {
        if used_percent >= self.exhausted_percent {
            Level::Exhausted
        } else if used_percent >= self.critical_percent {
            Level::Critical
        } else if used_percent >= self.warning_percent {
            Level::Warning
        } else {
            Level::Ok
        }
    }

    /// Classifies a remaining balance in USD.
    pub fn level_for_balance(&self, balance_usd: f64) -> Level {
        if balance_usd <= self.exhausted_balance {
            Level::Exhausted
        } else if balance_usd < self.critical_balance {
            Level::Critical
        } else if balance_usd < self.warning_balance {
            Level::Warning
        } else {
            Level::Ok
        }
    }

    fn clamped(self) -> Self {
        let sanitize = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        let defaults = Self::default();

        let exhausted_percent =
            sanitize(self.exhausted_percent, defaults.exhausted_percent).clamp(0.0, 100.0);
        let critical_percent =
            sanitize(self.critical_percent, defaults.critical_percent).clamp(0.0, exhausted_percent);
        let warning_percent =
            sanitize(self.warning_percent, defaults.warning_percent).clamp(0.0, critical_percent);

        let exhausted_balance = sanitize(self.exhausted_balance, defaults.exhausted_balance).max(0.0);
        let critical_balance =
            sanitize(self.critical_balance, defaults.critical_balance).max(exhausted_balance);
        let warning_balance =
            sanitize(self.warning_balance, defaults.warning_balance).max(critical_balance);

        Self {
            warning_percent,
            critical_percent,
            exhausted_percent,
            warning_balance,
            critical_balance,
            exhausted_balance,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
