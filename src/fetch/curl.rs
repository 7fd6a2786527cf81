//! Listing transport for the plaintext strategy: `curl` reading `.netrc`.
//!
//! `curl` authenticates from the netrc file itself; no credential passes
//! through this process. By default the response body is cached whatever
//! the HTTP status, so an error page can replace a good snapshot. Set
//! `fetch.fail_on_http_error` to have `curl --fail` reject such responses.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

use super::ListingTransport;
use crate::config::FetchConfig;
use crate::error::FetchError;

/// Extra time granted past curl's own `--max-time` before the child is abandoned.
const KILL_GRACE: Duration = Duration::from_secs(5);

/// Runs the external `curl` client with netrc authentication.
#[derive(Debug, Clone)]
pub struct NetrcCurlTransport {
    program: PathBuf,
    url: String,
    accept: String,
    netrc_path: PathBuf,
    timeout: Duration,
    fail_on_http_error: bool,
}

impl NetrcCurlTransport {
    /// Create a transport from the fetch configuration.
    ///
    /// A relative `curl_program` is resolved on `PATH` now; if it cannot be
    /// found the name is kept and the spawn fails at fetch time.
    #[must_use]
    pub fn new(config: &FetchConfig, netrc_path: PathBuf) -> Self {
        let program = if config.curl_program.is_absolute() {
            config.curl_program.clone()
        } else {
            match which::which(&config.curl_program) {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(
                        program = %config.curl_program.display(),
                        error = %e,
                        "curl not found on PATH"
                    );
                    config.curl_program.clone()
                }
            }
        };

        Self {
            program,
            url: config.url.clone(),
            accept: config.curl_accept.clone(),
            netrc_path,
            timeout: Duration::from_secs(config.timeout_secs),
            fail_on_http_error: config.fail_on_http_error,
        }
    }

    /// Command-line arguments passed to curl.
    #[must_use]
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--silent".into(),
            "--show-error".into(),
            "--header".into(),
            format!("Accept: {}", self.accept).into(),
            "--netrc".into(),
            "--netrc-file".into(),
            self.netrc_path.clone().into_os_string(),
            "--max-time".into(),
            self.timeout.as_secs().to_string().into(),
        ];
        if self.fail_on_http_error {
            args.push("--fail".into());
        }
        args.push(self.url.clone().into());
        args
    }

    fn transport_error(&self, reason: impl Into<String>) -> FetchError {
        FetchError::Transport {
            url: self.url.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ListingTransport for NetrcCurlTransport {
    fn name(&self) -> &'static str {
        "curl-netrc"
    }

    fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let child = tokio::process::Command::new(&self.program)
            .args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                self.transport_error(format!(
                    "failed to spawn {}: {e}",
                    self.program.display()
                ))
            })?;

        let output = tokio::time::timeout(self.timeout + KILL_GRACE, child.wait_with_output())
            .await
            .map_err(|_| self.transport_error("curl did not finish in time"))?
            .map_err(|e| self.transport_error(format!("failed to collect curl output: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.transport_error(format!(
                "curl exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}
