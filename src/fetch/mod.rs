//! Single-attempt retrieval of the remote listing into the snapshot cache.
//!
//! The fetcher only knows the [`ListingTransport`] capability; which
//! credential strategy sits behind it is decided by
//! [`CredentialResolver`](crate::credentials::CredentialResolver).
//!
//! Failures are returned as [`FetchError`] and never touch the snapshot on
//! disk. The cycle logs them and carries on with whatever is cached.

mod curl;
mod http;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use curl::NetrcCurlTransport;
pub use http::BasicAuthTransport;

use crate::error::FetchError;
use crate::persist::write_atomic;

/// One authenticated read of the listing endpoint.
#[async_trait]
pub trait ListingTransport: Send + Sync {
    /// Short transport name for logs.
    fn name(&self) -> &'static str;

    /// The URL this transport reads.
    fn url(&self) -> &str;

    /// Perform the request and return the raw body to cache.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if no body suitable for caching was obtained.
    async fn fetch(&self) -> Result<Vec<u8>, FetchError>;
}

/// Summary of a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    /// Transport that produced the body.
    pub transport: &'static str,
    /// Number of bytes written to the snapshot.
    pub bytes: usize,
}

/// Writes the listing fetched by a transport to the snapshot artifact.
pub struct RemoteFetcher {
    transport: Box<dyn ListingTransport>,
    snapshot: PathBuf,
}

impl RemoteFetcher {
    /// Create a fetcher writing to `snapshot`.
    #[must_use]
    pub fn new(transport: Box<dyn ListingTransport>, snapshot: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            snapshot: snapshot.into(),
        }
    }

    /// Snapshot artifact location.
    #[must_use]
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot
    }

    /// Fetch the listing once and replace the snapshot with the body.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on credential, transport, status or write
    /// failure. The snapshot is left as it was.
    pub async fn refresh(&self) -> Result<FetchReport, FetchError> {
        let transport = self.transport.name();
        let url = self.transport.url();
        tracing::info!(transport, url, "fetching listing");

        let body = match self.transport.fetch().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(
                    transport,
                    url,
                    snapshot = %self.snapshot_path().display(),
                    error = %e,
                    "listing fetch failed, keeping cached snapshot"
                );
                return Err(e);
            }
        };

        write_atomic(&self.snapshot, &body).map_err(|e| {
            let err = FetchError::Write {
                path: self.snapshot.clone(),
                reason: e.to_string(),
            };
            tracing::error!(error = %err, "cannot store fetched listing");
            err
        })?;

        tracing::info!(
            transport,
            bytes = body.len(),
            snapshot = %self.snapshot_path().display(),
            "listing downloaded"
        );
        Ok(FetchReport {
            transport,
            bytes: body.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    struct StaticTransport(Result<Vec<u8>, u16>);

    #[async_trait]
    impl ListingTransport for StaticTransport {
        fn name(&self) -> &'static str {
            "static"
        }

        fn url(&self) -> &str {
            "https://listing.test/api"
        }

        async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
            match &self.0 {
                Ok(body) => Ok(body.clone()),
                Err(status) => Err(FetchError::Status {
                    url: self.url().to_owned(),
                    status: *status,
                }),
            }
        }
    }

    #[tokio::test]
    async fn successful_fetch_overwrites_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let snapshot = dir.path().join("info_progs.json");
        std::fs::write(&snapshot, r#"[{"id":0}]"#).expect("seed");

        let fetcher = RemoteFetcher::new(
            Box::new(StaticTransport(Ok(br#"[{"id":1}]"#.to_vec()))),
            &snapshot,
        );
        assert_eq!(fetcher.snapshot_path(), snapshot.as_path());
        let report = fetcher.refresh().await.expect("refresh");

        assert_eq!(report.bytes, 10);
        assert_eq!(report.transport, "static");
        assert_eq!(
            std::fs::read_to_string(&snapshot).expect("read"),
            r#"[{"id":1}]"#
        );
    }

    #[tokio::test]
    async fn failed_fetch_keeps_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let snapshot = dir.path().join("info_progs.json");
        std::fs::write(&snapshot, r#"[{"id":0}]"#).expect("seed");

        let fetcher = RemoteFetcher::new(Box::new(StaticTransport(Err(503))), &snapshot);
        let result = fetcher.refresh().await;

        assert!(matches!(result, Err(FetchError::Status { status: 503, .. })));
        assert_eq!(
            std::fs::read_to_string(&snapshot).expect("read"),
            r#"[{"id":0}]"#
        );
    }

    #[tokio::test]
    async fn failed_fetch_without_snapshot_creates_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let snapshot = dir.path().join("info_progs.json");

        let fetcher = RemoteFetcher::new(Box::new(StaticTransport(Err(401))), &snapshot);
        assert!(fetcher.refresh().await.is_err());
        assert!(!snapshot.exists());
    }
}
