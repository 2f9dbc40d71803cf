// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `sluice watch`: run one connection manager per channel until stopped.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;

use sluice_core::{Error, KeyValueStore, Result};

use crate::config::Config;
use crate::connection::{ConnectionManager, Handlers};
use crate::registry::ClientRegistry;
use crate::transport::Connector;

/// Receives each delivered event, encoded as one JSON line.
pub type LineSink = Arc<dyn Fn(&str) + Send + Sync>;

pub async fn run<C, F>(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    connector: C,
    shutdown: F,
    sink: LineSink,
) -> Result<()>
where
    C: Connector + Clone + 'static,
    F: Future<Output = ()>,
{
    if config.channels.is_empty() {
        return Err(Error::Config(
            "no channels to watch\n  hint: pass --channel or set `channels` in the config file"
                .to_string(),
        ));
    }
    let strategy = config.conflict_strategy()?;

    let mut registry = ClientRegistry::new();
    let mut tasks = JoinSet::new();

    for channel in &config.channels {
        let (manager, handle) = ConnectionManager::builder(
            config.connection_config(channel),
            connector.clone(),
            Arc::clone(&store),
        )
        .handlers(handlers(channel, Arc::clone(&sink)))
        .conflict_strategy(strategy.clone())
        .build()
        .await;

        tasks.spawn(manager.run());
        handle.connect()?;
        registry.insert(handle);
    }

    tracing::info!(channels = ?registry.channels(), "watching");
    shutdown.await;

    tracing::info!("shutting down");
    registry.shutdown_all();
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::warn!("connection task ended abnormally: {e}");
        }
    }
    Ok(())
}

fn handlers(channel: &str, sink: LineSink) -> Handlers {
    let state_channel = channel.to_string();
    let error_channel = channel.to_string();
    Handlers::new()
        .on_event(move |event| match serde_json::to_string(event) {
            Ok(line) => sink(&line),
            Err(e) => tracing::warn!(event = %event.id, "cannot encode event: {e}"),
        })
        .on_state_change(move |new, old| {
            tracing::info!(channel = %state_channel, "{old} -> {new}");
        })
        .on_error(move |report| {
            tracing::warn!(
                channel = %error_channel,
                code = %report.code,
                retryable = report.retryable,
                "{}",
                report.message
            );
        })
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
