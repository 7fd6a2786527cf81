//! Listing API contract tests for the encrypted (Basic auth) transport.
//!
//! These tests verify the exact HTTP exchange with the listing endpoint:
//! - Basic credentials come from the secret store on every request
//! - The JSON `Accept` header is sent
//! - Only 2xx bodies are returned for caching

use std::sync::Arc;

use select_cron::config::FetchConfig;
use select_cron::credentials::{MemorySecretStore, SecretStore, StoredCredentials};
use select_cron::fetch::{BasicAuthTransport, ListingTransport, RemoteFetcher};
use select_cron::FetchError;
use wiremock::matchers::{basic_auth, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PATH: &str = "/api/v1/progweek";

fn fetch_config(server: &MockServer) -> FetchConfig {
    FetchConfig {
        url: format!("{}{LISTING_PATH}", server.uri()),
        timeout_secs: 5,
        ..FetchConfig::default()
    }
}

fn credentials(entries: &[(&str, &str)]) -> StoredCredentials {
    let store = MemorySecretStore::new();
    for (account, value) in entries {
        store.insert("media-select", account, value);
    }
    let store: Arc<dyn SecretStore> = Arc::new(store);
    StoredCredentials::new(store, "media-select", "username", "password")
}

fn transport(server: &MockServer, entries: &[(&str, &str)]) -> BasicAuthTransport {
    BasicAuthTransport::new(&fetch_config(server), credentials(entries)).expect("transport")
}

#[tokio::test]
async fn test_request_sends_basic_auth_and_json_accept() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(basic_auth("alice", "s3cret"))
        .and(header("accept", "application/json; indent=4"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"id":1}]"#))
        .expect(1)
        .mount(&server)
        .await;

    let body = transport(&server, &[("username", "alice"), ("password", "s3cret")])
        .fetch()
        .await
        .expect("fetch");

    assert_eq!(body, br#"[{"id":1}]"#);
}

#[tokio::test]
async fn test_body_is_returned_verbatim() {
    let server = MockServer::start().await;
    let listing = "[\n    {\n        \"id\": 1\n    }\n]\n";

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .mount(&server)
        .await;

    let body = transport(&server, &[("username", "alice"), ("password", "pw")])
        .fetch()
        .await
        .expect("fetch");

    assert_eq!(String::from_utf8(body).expect("utf8"), listing);
}

#[tokio::test]
async fn test_unauthorized_is_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string(r#"{"detail":"Invalid username/password."}"#),
        )
        .mount(&server)
        .await;

    let result = transport(&server, &[("username", "alice"), ("password", "wrong")])
        .fetch()
        .await;

    assert!(matches!(result, Err(FetchError::Status { status: 401, .. })));
}

#[tokio::test]
async fn test_missing_secret_skips_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(0)
        .mount(&server)
        .await;

    let result = transport(&server, &[("username", "alice")]).fetch().await;

    assert!(matches!(result, Err(FetchError::CredentialUnavailable(_))));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let config = FetchConfig {
        url: format!("http://127.0.0.1:1{LISTING_PATH}"),
        timeout_secs: 5,
        ..FetchConfig::default()
    };

    let transport = BasicAuthTransport::new(
        &config,
        credentials(&[("username", "alice"), ("password", "pw")]),
    )
    .expect("transport");

    let result = transport.fetch().await;
    assert!(matches!(result, Err(FetchError::Transport { .. })));
}

#[tokio::test]
async fn test_server_error_keeps_cached_snapshot() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let snapshot = dir.path().join("info_progs.json");
    std::fs::write(&snapshot, r#"[{"id":"cached"}]"#).expect("seed");

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = RemoteFetcher::new(
        Box::new(transport(
            &server,
            &[("username", "alice"), ("password", "pw")],
        )),
        &snapshot,
    );
    assert!(fetcher.refresh().await.is_err());

    assert_eq!(
        std::fs::read_to_string(&snapshot).expect("read"),
        r#"[{"id":"cached"}]"#
    );
}
