// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use sluice_core::ErrorCode;
use tempfile::TempDir;
use yare::parameterized;

#[test]
fn test_minimal_config_uses_defaults() {
    let config = Config::from_toml(r#"url = "wss://events.example.com/stream""#).unwrap();

    assert!(config.channels.is_empty());
    assert_eq!(config.backoff, BackoffPolicy::default());
    assert_eq!(config.connect_timeout_ms, 5_000);
    assert_eq!(config.retention_days, 7);
    assert_eq!(config.snapshot_ttl_secs, 86_400);
    assert_eq!(config.snapshot_timeout_ms, 10_000);
    assert_eq!(config.maintenance_interval_secs, 86_400);
    assert_eq!(config.conflict, "server-wins");
    assert!(config.db_path.is_none());
}

#[test]
fn test_partial_backoff_table() {
    let config = Config::from_toml(
        r#"
url = "ws://localhost:7890/events"
channels = ["acme", "globex"]
conflict = "merge"

[backoff]
base_ms = 500
max_attempts = 3
"#,
    )
    .unwrap();

    assert_eq!(config.channels, vec!["acme", "globex"]);
    assert_eq!(config.backoff.base_ms, 500);
    assert_eq!(config.backoff.max_attempts, 3);
    assert_eq!(config.backoff.max_delay_ms, 32_000);
    assert_eq!(config.conflict_strategy().unwrap().name(), "merge");
}

#[parameterized(
    http_scheme = { r#"url = "http://example.com""#, "must start with ws://" },
    no_host = { r#"url = "ws://""#, "invalid url" },
    zero_attempts = { "url = \"ws://h/e\"\n[backoff]\nmax_attempts = 0", "max_attempts" },
    base_over_max = { "url = \"ws://h/e\"\n[backoff]\nbase_ms = 9000\nmax_delay_ms = 10", "exceeds" },
    blank_channel = { "url = \"ws://h/e\"\nchannels = [\" \"]", "must not be empty" },
    unknown_strategy = { "url = \"ws://h/e\"\nconflict = \"newest\"", "unknown conflict strategy" },
    manual_strategy = { "url = \"ws://h/e\"\nconflict = \"manual\"", "resolver supplied in code" },
    missing_url = { "channels = [\"acme\"]", "failed to parse" },
)]
fn test_invalid_config_is_rejected(toml: &str, message: &str) {
    let err = Config::from_toml(toml).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Internal);
    assert!(
        err.to_string().contains(message),
        "expected '{message}' in '{err}'"
    );
}

#[test]
fn test_connection_config_for_channel() {
    let mut config = Config::new("ws://localhost:7890/events");
    config.connect_timeout_ms = 250;
    config.retention_days = 2;
    config.snapshot_timeout_ms = 1_500;

    let conn = config.connection_config("acme");

    assert_eq!(conn.url, "ws://localhost:7890/events");
    assert_eq!(conn.channel_key, "acme");
    assert_eq!(conn.connect_timeout, Duration::from_millis(250));
    assert_eq!(conn.retention, Duration::from_secs(2 * 24 * 60 * 60));
    assert_eq!(conn.snapshot_ttl, Duration::from_secs(86_400));
    assert_eq!(conn.snapshot_timeout, Duration::from_millis(1_500));
    assert_eq!(conn.maintenance_interval, Duration::from_secs(86_400));
}

#[test]
fn test_zero_maintenance_interval_is_clamped() {
    let mut config = Config::new("ws://h/e");
    config.maintenance_interval_secs = 0;
    assert_eq!(
        config.connection_config("acme").maintenance_interval,
        Duration::from_secs(1)
    );
}

#[test]
fn test_config_save_and_reload() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sluice.toml");

    let mut config = Config::new("wss://events.example.com/stream");
    config.channels = vec!["acme".to_string()];
    config.backoff.jitter_ms = 0;
    config.db_path = Some(temp.path().join("events.db"));
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.url, config.url);
    assert_eq!(loaded.channels, config.channels);
    assert_eq!(loaded.backoff, config.backoff);
    assert_eq!(loaded.db_path(), temp.path().join("events.db"));
}

#[test]
fn test_config_load_missing_file() {
    let temp = TempDir::new().unwrap();
    let err = Config::load(&temp.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("failed to read"));
}

#[test]
fn test_db_path_defaults_to_data_dir() {
    let config = Config::new("ws://h/e");
    assert_eq!(config.db_path(), default_db_path());
    assert!(default_db_path().ends_with("sluice.db"));
}
