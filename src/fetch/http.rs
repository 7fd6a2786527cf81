//! Listing transport for the encrypted strategy: `reqwest` with Basic auth.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;

use super::ListingTransport;
use crate::config::FetchConfig;
use crate::credentials::StoredCredentials;
use crate::error::{CycleError, FetchError};

/// GET with Basic credentials read from the secret store at request time.
///
/// Only a 2xx response body is returned for caching; anything else is an
/// error so the previous snapshot survives.
#[derive(Debug)]
pub struct BasicAuthTransport {
    client: reqwest::Client,
    url: String,
    accept: String,
    credentials: StoredCredentials,
}

impl BasicAuthTransport {
    /// Build the transport and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::Config`] if the client cannot be constructed.
    pub fn new(config: &FetchConfig, credentials: StoredCredentials) -> Result<Self, CycleError> {
        let client = build_client(config)?;
        Ok(Self {
            client,
            url: config.url.clone(),
            accept: config.accept.clone(),
            credentials,
        })
    }
}

/// Build a [`reqwest::Client`] for the listing API.
///
/// The client has the configured request timeout and a crate User-Agent.
///
/// # Errors
///
/// Returns [`CycleError::Config`] if the client cannot be constructed.
pub fn build_client(config: &FetchConfig) -> Result<reqwest::Client, CycleError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(concat!("select-cron/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| CycleError::Config(format!("failed to build HTTP client: {e}")))
}

#[async_trait]
impl ListingTransport for BasicAuthTransport {
    fn name(&self) -> &'static str {
        "basic-auth"
    }

    fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let credentials = self.credentials.load()?;

        let response = self
            .client
            .get(&self.url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .header(ACCEPT, &self.accept)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            url: self.url.clone(),
            reason: format!("failed to read body: {e}"),
        })?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_client_with_default_config() {
        let config = FetchConfig::default();
        assert!(build_client(&config).is_ok());
    }
}
