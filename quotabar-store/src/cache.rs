//! Report cache.
//!
//! A single JSON document `{"timestamp": <unix seconds>, "data": <report>}`.
//! Reads never fail: anything unusable is a miss. Writes are atomic and
//! best-effort.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use quotabar_core::{UsageReport, UsageSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::persistence::{load_json, save_json};

/// On-disk cache document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Write time as fractional unix seconds.
    pub timestamp: f64,
    /// The cached report.
    pub data: UsageReport,
}

impl CacheEntry {
    /// Creates an entry stamped with `now`.
    pub fn new(data: UsageReport, now: DateTime<Utc>) -> Self {
        Self {
            timestamp: unix_seconds(now),
            data,
        }
    }

    /// Returns true if the entry is younger than `ttl` at `now`.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let elapsed = unix_seconds(now) - self.timestamp;
        elapsed < ttl.as_secs_f64()
    }
}

#[allow(clippy::cast_precision_loss)]
fn unix_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

/// File-backed report cache.
#[derive(Debug, Clone)]
pub struct Cache {
    path: PathBuf,
}

impl Cache {
    /// Creates a cache at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the cache document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the cached report if it is fresh now.
    pub async fn get(&self, ttl: Duration) -> Option<UsageReport> {
        self.get_at(ttl, Utc::now()).await
    }

    /// Returns the cached report if it is fresh at `now`.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn get_at(&self, ttl: Duration, now: DateTime<Utc>) -> Option<UsageReport> {
        let entry: CacheEntry = match load_json(&self.path).await {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Cache miss");
                return None;
            }
        };

        if let Err(e) = entry.data.iter().try_for_each(UsageSnapshot::validate) {
            debug!(error = %e, "Cached report is invalid");
            return None;
        }

        if entry.is_fresh(ttl, now) {
            debug!(providers = entry.data.len(), "Cache hit");
            Some(entry.data)
        } else {
            debug!("Cache entry expired");
            None
        }
    }

    /// Stores `report`, stamped with the current time.
    pub async fn put(&self, report: &UsageReport) {
        self.put_at(report, Utc::now()).await;
    }

    /// Stores `report`, stamped with `now`. Failures are logged and ignored.
    #[instrument(skip(self, report), fields(path = %self.path.display()))]
    pub async fn put_at(&self, report: &UsageReport, now: DateTime<Utc>) {
        let entry = CacheEntry::new(report.clone(), now);
        if let Err(e) = save_json(&self.path, &entry).await {
            warn!(error = %e, "Failed to write usage cache");
        }
    }
}
