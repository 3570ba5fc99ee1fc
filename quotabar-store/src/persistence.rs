//! File persistence helpers.
//!
//! Handles loading and saving JSON documents with owner-only permissions.

use quotabar_fetch::write_atomic;
use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::error::StoreError;

/// Application directory name under the platform config and cache dirs.
const APP_DIR: &str = "quotabar";

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory.
///
/// - macOS: `~/Library/Application Support/quotabar`
/// - Linux: `~/.config/quotabar`
/// - Windows: `%APPDATA%\quotabar`
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|c| c.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the default cache directory.
///
/// - macOS: `~/Library/Caches/quotabar`
/// - Linux: `~/.cache/quotabar`
/// - Windows: `%LOCALAPPDATA%\quotabar`
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|c| c.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the default config file path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.json")
}

/// Returns the cache file inside a cache directory.
pub fn cache_file(cache_dir: &Path) -> PathBuf {
    cache_dir.join("usage.json")
}

// ============================================================================
// File Operations
// ============================================================================

/// Saves data to a JSON file with owner-only permissions.
///
/// The write is atomic: readers see either the previous document or this one.
///
/// # Errors
///
/// Returns an error if serialization or any filesystem step fails.
#[instrument(skip(data), fields(path = %path.display()))]
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(data)?;
    write_atomic(path, &json).await?;
    debug!("JSON file saved");
    Ok(())
}

/// Loads data from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse as `T`.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = tokio::fs::read_to_string(path).await?;
    let data = serde_json::from_str(&content)?;
    debug!(path = %path.display(), "JSON file loaded");
    Ok(data)
}

// ============================================================================
// Tests
// ============================================================================
