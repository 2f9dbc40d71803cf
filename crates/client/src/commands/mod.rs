// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod pending;
pub mod reset;
pub mod sweep;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sluice_core::{Error, KeyValueStore, Result, SqliteStore};

use crate::config::{default_db_path, Config};

const CONFIG_FILE_NAME: &str = "sluice.toml";

/// Default configuration location, `<config dir>/sluice/sluice.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sluice").join(CONFIG_FILE_NAME))
}

/// Loads the configuration named on the command line, or the default one if
/// it exists.
pub fn load_config(path: Option<&Path>) -> Result<Option<Config>> {
    if let Some(path) = path {
        return Config::load(path).map(Some);
    }
    match default_config_path() {
        Some(path) if path.is_file() => Config::load(&path).map(Some),
        _ => Ok(None),
    }
}

/// Applies `watch` flags on top of the loaded configuration.
pub fn watch_config(
    config: Option<Config>,
    url: Option<String>,
    channels: Vec<String>,
) -> Result<Config> {
    let mut config = match (config, url) {
        (Some(mut config), Some(url)) => {
            config.url = url;
            config
        }
        (Some(config), None) => config,
        (None, Some(url)) => Config::new(url),
        (None, None) => {
            return Err(Error::Config(
                "no subscription url\n  hint: pass --url or set `url` in the config file"
                    .to_string(),
            ))
        }
    };
    if !channels.is_empty() {
        config.channels = channels;
    }
    config.validate()?;
    Ok(config)
}

/// Database path: the `--db` flag, then the configuration, then the default.
pub fn resolve_db_path(flag: Option<&Path>, config: Option<&Config>) -> PathBuf {
    match (flag, config) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(config)) => config.db_path(),
        (None, None) => default_db_path(),
    }
}

/// Helper to open the durable store.
pub fn open_store(path: &Path) -> Result<Arc<dyn KeyValueStore>> {
    tracing::debug!("opening store at {}", path.display());
    Ok(Arc::new(SqliteStore::open(path)?))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
