//! Cross-platform encrypted secret store.
//!
//! Uses the `keyring` crate which provides OS-appropriate secure storage:
//! - **Linux**: Secret Service API (GNOME Keyring, KWallet)
//! - **macOS**: Keychain Services
//! - **Windows**: Windows Credential Manager

use super::{CredentialError, SecretStore};

/// Secret store backed by the platform keyring.
#[derive(Debug, Default)]
pub struct KeyringSecretStore;

impl KeyringSecretStore {
    /// Create a new keyring-backed store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SecretStore for KeyringSecretStore {
    fn get(&self, service: &str, account: &str) -> Result<Option<String>, CredentialError> {
        let entry = keyring::Entry::new(service, account).map_err(|e| {
            CredentialError::StoreAccess(format!("Failed to create keyring entry: {e}"))
        })?;

        match entry.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CredentialError::StoreAccess(format!(
                "Failed to retrieve credential: {e}"
            ))),
        }
    }
}
