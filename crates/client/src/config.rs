// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is read from a TOML file and includes:
//! - `url`: the subscription endpoint (`ws://` or `wss://`)
//! - `channels`: channel keys to subscribe to
//! - `[backoff]`: reconnect timing
//! - timeouts, retention and the conflict strategy

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sluice_core::{BackoffPolicy, ConflictStrategy, Error, Result};

use crate::connection::ConnectionConfig;

const DATA_DIR_NAME: &str = "sluice";
const DB_FILE_NAME: &str = "sluice.db";

/// Client configuration, usually loaded from `sluice.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Subscription endpoint.
    pub url: String,
    /// Channels to subscribe to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<String>,
    #[serde(default)]
    pub backoff: BackoffPolicy,
    /// Max time to wait for the stream to open (default: 5000).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Days to keep synced queue entries (default: 7).
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
    /// Lifetime of a cached snapshot in seconds (default: 86400).
    #[serde(default = "default_snapshot_ttl_secs")]
    pub snapshot_ttl_secs: u64,
    /// Max time to wait for a snapshot fetch (default: 10000).
    #[serde(default = "default_snapshot_timeout_ms")]
    pub snapshot_timeout_ms: u64,
    /// Seconds between maintenance sweeps (default: 86400).
    #[serde(default = "default_maintenance_interval_secs")]
    pub maintenance_interval_secs: u64,
    /// Conflict strategy name: `server-wins`, `client-wins` or `merge`.
    #[serde(default = "default_conflict")]
    pub conflict: String,
    /// Database path. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_retention_days() -> u64 {
    7
}

fn default_snapshot_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_snapshot_timeout_ms() -> u64 {
    10_000
}

fn default_maintenance_interval_secs() -> u64 {
    24 * 60 * 60
}

fn default_conflict() -> String {
    "server-wins".to_string()
}

impl Config {
    /// Creates a config for `url` with every other field defaulted.
    pub fn new(url: impl Into<String>) -> Self {
        Config {
            url: url.into(),
            channels: Vec::new(),
            backoff: BackoffPolicy::default(),
            connect_timeout_ms: default_connect_timeout_ms(),
            retention_days: default_retention_days(),
            snapshot_ttl_secs: default_snapshot_ttl_secs(),
            snapshot_timeout_ms: default_snapshot_timeout_ms(),
            maintenance_interval_secs: default_maintenance_interval_secs(),
            conflict: default_conflict(),
            db_path: None,
        }
    }

    /// Loads and validates configuration from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)
            .map_err(|e| Error::Config(format!("failed to write {}: {}", path.display(), e)))
    }

    /// Checks the URL scheme, the backoff limits and the strategy name.
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(Error::Config(format!(
                "invalid url '{}': must start with ws:// or wss://",
                self.url
            )));
        }
        url::Url::parse(&self.url)
            .map_err(|e| Error::Config(format!("invalid url '{}': {}", self.url, e)))?;

        if self.backoff.max_attempts == 0 {
            return Err(Error::Config(
                "backoff.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.backoff.base_ms > self.backoff.max_delay_ms {
            return Err(Error::Config(format!(
                "backoff.base_ms ({}) exceeds backoff.max_delay_ms ({})",
                self.backoff.base_ms, self.backoff.max_delay_ms
            )));
        }
        if self.channels.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::Config("channel keys must not be empty".to_string()));
        }

        self.conflict_strategy().map(|_| ())
    }

    pub fn conflict_strategy(&self) -> Result<ConflictStrategy> {
        ConflictStrategy::from_name(&self.conflict)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_days.saturating_mul(24 * 60 * 60))
    }

    /// Per-manager settings for `channel_key`.
    pub fn connection_config(&self, channel_key: &str) -> ConnectionConfig {
        ConnectionConfig {
            url: self.url.clone(),
            channel_key: channel_key.to_string(),
            backoff: self.backoff,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            retention: self.retention(),
            maintenance_interval: Duration::from_secs(self.maintenance_interval_secs.max(1)),
            snapshot_ttl: Duration::from_secs(self.snapshot_ttl_secs),
            snapshot_timeout: Duration::from_millis(self.snapshot_timeout_ms),
        }
    }

    /// Database path, falling back to `<data dir>/sluice/sluice.db`.
    pub fn db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(default_db_path)
    }
}

/// `<data dir>/sluice/sluice.db`, or `./sluice.db` when the platform has no
/// data directory.
pub fn default_db_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join(DATA_DIR_NAME).join(DB_FILE_NAME),
        None => PathBuf::from(DB_FILE_NAME),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
