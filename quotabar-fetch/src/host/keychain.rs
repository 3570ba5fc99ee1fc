//! Read access to the system keychain.
//!
//! Some CLIs keep their OAuth material in the OS secret store instead of a
//! file (Claude Code on macOS). This module only ever reads: entries belong to
//! the tool that created them.

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, warn};

use crate::error::KeychainError;

// ============================================================================
// Keychain API Trait
// ============================================================================

/// API for reading secrets from the keychain.
#[async_trait]
pub trait KeychainApi: Send + Sync {
    /// Get a secret from the keychain.
    ///
    /// # Arguments
    /// * `service` - Service identifier (e.g., "Claude Code-credentials")
    /// * `account` - Account identifier, often the login user name
    ///
    /// # Returns
    /// * `Ok(Some(secret))` - Secret found
    /// * `Ok(None)` - No entry
    /// * `Err(e)` - Error accessing keychain
    async fn get(&self, service: &str, account: &str) -> Result<Option<String>, KeychainError>;
}

// ============================================================================
// System Keychain Implementation
// ============================================================================

/// Default implementation using the `keyring` crate.
#[derive(Debug, Clone, Default)]
pub struct SystemKeychain;

impl SystemKeychain {
    /// Creates a new system keychain instance.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl KeychainApi for SystemKeychain {
    async fn get(&self, service: &str, account: &str) -> Result<Option<String>, KeychainError> {
        debug!(service = %service, account = %account, "Reading keychain entry");

        let entry = Entry::new(service, account).map_err(KeychainError::from)?;

        match entry.get_password() {
            Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
            // Empty password or no entry both mean "not found"
            Ok(_) | Err(keyring::Error::NoEntry) => {
                debug!(service = %service, account = %account, "Keychain entry not found");
                Ok(None)
            }
            Err(e) => {
                warn!(service = %service, account = %account, error = %e, "Failed to read keychain entry");
                Err(e.into())
            }
        }
    }
}
