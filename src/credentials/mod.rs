//! Credential strategy selection for the listing fetch.
//!
//! Exactly one of two strategies is chosen from configuration and kept for
//! the process lifetime:
//!
//! - **Encrypted**: username and password live in the platform secret store
//!   and are read at the moment of each fetch.
//! - **Plaintext**: credentials live in the user's `.netrc`, which `curl`
//!   reads itself. The file must exist at start-up.
//!
//! Both strategies are exposed to the fetcher the same way, as a
//! [`ListingTransport`](crate::fetch::ListingTransport) built by
//! [`CredentialResolver::transport`].
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use select_cron::credentials::{CredentialResolver, KeyringSecretStore};
//! use select_cron::SelectConfig;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SelectConfig::default();
//! let resolver =
//!     CredentialResolver::from_config(&config.credentials, Arc::new(KeyringSecretStore::new()))?;
//! let transport = resolver.transport(&config.fetch)?;
//! # Ok(())
//! # }
//! ```

mod encrypted;
mod types;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub use encrypted::KeyringSecretStore;
pub use types::{BasicCredentials, CredentialError};

use crate::config::{CredentialsConfig, FetchConfig};
use crate::error::{CycleError, Result};
use crate::fetch::{BasicAuthTransport, ListingTransport, NetrcCurlTransport};

/// Read access to a service/account keyed secret store.
pub trait SecretStore: Send + Sync {
    /// Fetch the secret for `account` under `service`.
    ///
    /// Returns `Ok(None)` when the store holds no such entry.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::StoreAccess`] if the store cannot be queried.
    fn get(&self, service: &str, account: &str) -> std::result::Result<Option<String>, CredentialError>;
}

/// In-memory secret store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemorySecretStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a secret.
    pub fn insert(&self, service: &str, account: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert((service.to_owned(), account.to_owned()), value.to_owned());
        }
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, service: &str, account: &str) -> std::result::Result<Option<String>, CredentialError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CredentialError::StoreAccess("memory store poisoned".to_owned()))?;
        Ok(entries
            .get(&(service.to_owned(), account.to_owned()))
            .cloned())
    }
}

/// The credential strategy selected at configuration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStrategy {
    /// Username and password read from the secret store.
    Encrypted {
        /// Secret store service identifier.
        service: String,
        /// Account holding the username.
        username_account: String,
        /// Account holding the password.
        password_account: String,
    },
    /// Credentials read by `curl` from a netrc file.
    Plaintext {
        /// Netrc file location.
        netrc_path: PathBuf,
    },
}

impl CredentialStrategy {
    /// Short strategy name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Encrypted { .. } => "encrypted",
            Self::Plaintext { .. } => "plaintext",
        }
    }
}

/// Secret-store lookup of a Basic credential pair, performed on every call.
#[derive(Clone)]
pub struct StoredCredentials {
    store: Arc<dyn SecretStore>,
    service: String,
    username_account: String,
    password_account: String,
}

impl StoredCredentials {
    /// Look up `username_account` and `password_account` under `service`.
    #[must_use]
    pub fn new(
        store: Arc<dyn SecretStore>,
        service: impl Into<String>,
        username_account: impl Into<String>,
        password_account: impl Into<String>,
    ) -> Self {
        Self {
            store,
            service: service.into(),
            username_account: username_account.into(),
            password_account: password_account.into(),
        }
    }

    /// Read both secrets now.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::NotFound`] if either secret is absent, or
    /// [`CredentialError::StoreAccess`] if the store cannot be read.
    pub fn load(&self) -> std::result::Result<BasicCredentials, CredentialError> {
        let username = self.lookup(&self.username_account)?;
        let password = self.lookup(&self.password_account)?;
        Ok(BasicCredentials { username, password })
    }

    fn lookup(&self, account: &str) -> std::result::Result<String, CredentialError> {
        self.store
            .get(&self.service, account)?
            .ok_or_else(|| CredentialError::NotFound(account.to_owned()))
    }
}

impl std::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("service", &self.service)
            .field("username_account", &self.username_account)
            .field("password_account", &self.password_account)
            .finish_non_exhaustive()
    }
}

/// Chooses the credential strategy and builds the matching transport.
pub struct CredentialResolver {
    strategy: CredentialStrategy,
    store: Arc<dyn SecretStore>,
}

impl CredentialResolver {
    /// Select the strategy from `config`.
    ///
    /// For the plaintext strategy the netrc file must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::Config`] when the plaintext strategy is selected
    /// and the netrc file is absent.
    pub fn from_config(config: &CredentialsConfig, store: Arc<dyn SecretStore>) -> Result<Self> {
        let strategy = if config.encrypted {
            CredentialStrategy::Encrypted {
                service: config.service.clone(),
                username_account: config.username_account.clone(),
                password_account: config.password_account.clone(),
            }
        } else {
            if !config.netrc_path.is_file() {
                tracing::error!(
                    path = %config.netrc_path.display(),
                    "no netrc file for the plaintext credential strategy"
                );
                return Err(CycleError::Config(format!(
                    "netrc file {} not found",
                    config.netrc_path.display()
                )));
            }
            CredentialStrategy::Plaintext {
                netrc_path: config.netrc_path.clone(),
            }
        };

        tracing::debug!(strategy = strategy.name(), "credential strategy selected");
        Ok(Self { strategy, store })
    }

    /// The selected strategy.
    #[must_use]
    pub fn strategy(&self) -> &CredentialStrategy {
        &self.strategy
    }

    /// Build the transport implementing the selected strategy.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::Config`] if the HTTP client cannot be built.
    pub fn transport(&self, fetch: &FetchConfig) -> Result<Box<dyn ListingTransport>> {
        match &self.strategy {
            CredentialStrategy::Encrypted {
                service,
                username_account,
                password_account,
            } => {
                let credentials = StoredCredentials::new(
                    Arc::clone(&self.store),
                    service.clone(),
                    username_account.clone(),
                    password_account.clone(),
                );
                Ok(Box::new(BasicAuthTransport::new(fetch, credentials)?))
            }
            CredentialStrategy::Plaintext { netrc_path } => {
                Ok(Box::new(NetrcCurlTransport::new(fetch, netrc_path.clone())))
            }
        }
    }
}
