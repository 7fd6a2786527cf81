//! Startup behaviour of the `select-cron` binary.

use std::path::Path;
use std::process::Command;

fn log_contents(logs: &Path) -> String {
    std::fs::read_dir(logs)
        .expect("logs dir")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "log"))
        .map(|entry| std::fs::read_to_string(entry.path()).expect("read log"))
        .collect()
}

#[test]
fn invalid_config_is_logged_to_default_log_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path().join("data");
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[freshness\nstale_after_secs = ").expect("write config");

    let output = Command::new(env!("CARGO_BIN_EXE_select-cron"))
        .arg("--config")
        .arg(&config)
        .arg("status")
        .env("SELECT_CRON_DATA_DIR", &data_dir)
        .env("SELECT_CRON_CONFIG_DIR", dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("run binary");

    assert!(!output.status.success());
    let logged = log_contents(&data_dir.join("logs"));
    assert!(logged.contains("cannot load configuration"), "{logged}");
    assert!(logged.contains(&config.display().to_string()), "{logged}");
}

#[test]
fn valid_config_status_succeeds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path().join("data");
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[freshness]\nstale_after_secs = 1800\n").expect("write config");

    let output = Command::new(env!("CARGO_BIN_EXE_select-cron"))
        .arg("--config")
        .arg(&config)
        .arg("status")
        .env("SELECT_CRON_DATA_DIR", &data_dir)
        .env("SELECT_CRON_CONFIG_DIR", dir.path())
        .output()
        .expect("run binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("daily gate:"), "{stdout}");
}
