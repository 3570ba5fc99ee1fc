//! File helpers shared by the cache and credential write-back.
//!
//! Writers always go through [`write_atomic`]: the new content lands in a
//! sibling `.tmp` file which is then renamed over the target, so a reader sees
//! either the old document or the new one.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;

/// Returns the temporary sibling path used while writing `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("document"), OsString::from);
    name.push(".tmp");
    path.with_file_name(name)
}

/// Sets restrictive file permissions (0o600) on Unix systems.
#[cfg(unix)]
async fn set_restrictive_permissions(path: &Path) -> Result<(), FetchError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600); // Owner read/write only
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// No-op for non-Unix systems.
#[cfg(not(unix))]
async fn set_restrictive_permissions(_path: &Path) -> Result<(), FetchError> {
    Ok(())
}

/// Writes `contents` to `path` via temp file + rename.
///
/// Creates missing parent directories. The file ends up owner-only on Unix.
///
/// # Errors
///
/// Returns `FetchError::Io` if any step fails. No temp file is left behind
/// on failure.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), FetchError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp = temp_path(path);
    if let Err(e) = write_and_rename(&temp, path, contents).await {
        if tokio::fs::remove_file(&temp).await.is_ok() {
            debug!(temp = %temp.display(), "Removed temp file after failed write");
        }
        return Err(e);
    }

    debug!(path = %path.display(), bytes = contents.len(), "File written atomically");
    Ok(())
}

async fn write_and_rename(temp: &Path, path: &Path, contents: &[u8]) -> Result<(), FetchError> {
    tokio::fs::write(temp, contents).await?;
    set_restrictive_permissions(temp).await?;
    tokio::fs::rename(temp, path).await?;
    Ok(())
}

/// Reads and parses a JSON document.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid JSON.
pub fn read_json_file(path: &Path) -> Result<Value, FetchError> {
    let content = std::fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}
