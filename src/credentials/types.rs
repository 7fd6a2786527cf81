//! Core types for credential resolution.

use std::fmt;

/// Username/password pair for HTTP Basic authentication.
///
/// The custom [`Debug`] implementation redacts the password so credentials
/// never leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl BasicCredentials {
    /// Create a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Errors that can occur while reading credentials from the secret store.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The secret store has no entry for this account (never populated or locked).
    #[error("no secret stored for account '{0}'")]
    NotFound(String),

    /// The platform secret store could not be accessed.
    #[error("secret store access error: {0}")]
    StoreAccess(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let creds = BasicCredentials::new("alice", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn display_not_found_names_account() {
        let err = CredentialError::NotFound("password".into());
        assert_eq!(err.to_string(), "no secret stored for account 'password'");
    }
}
