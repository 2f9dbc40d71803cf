// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! sluice: real-time channel subscriptions that survive going offline.
//!
//! Each subscribed channel gets a [`ConnectionManager`] that keeps a push
//! stream open, reconnects with backoff, resumes from the last processed
//! event and queues what arrives while the consumer cannot take it.

pub mod cli;
pub mod commands;
pub mod config;
pub mod connection;
pub mod connectivity;
pub mod maintenance;
pub mod registry;
pub mod sync;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use cli::{Cli, Command, OutputFormat};
pub use config::Config;
pub use connection::{
    ConnectionConfig, ConnectionHandle, ConnectionManager, Handlers, ManagerBuilder,
    SharedConnectionState,
};
pub use connectivity::ConnectivitySignal;
pub use maintenance::{Maintenance, SweepReport};
pub use registry::ClientRegistry;
pub use sync::{SnapshotSource, SyncCoordinator, SyncOutcome};
pub use transport::{Connector, Transport, TransportError, WebSocketConnector};

pub use sluice_core::{
    ConflictStrategy, ConnectionState, Error, ErrorCode, ErrorReport, Event, EventType, Result,
};

use std::io;
use std::sync::Arc;

use sluice_core::SystemClock;

/// Runs one CLI command.
pub async fn run(cli: Cli) -> Result<()> {
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Watch { url, channels } => {
            let config = commands::watch_config(config, url, channels)?;
            let store = commands::open_store(&commands::resolve_db_path(
                cli.db.as_deref(),
                Some(&config),
            ))?;
            let sink: commands::watch::LineSink = Arc::new(|line: &str| println!("{line}"));
            commands::watch::run(&config, store, WebSocketConnector, shutdown_signal(), sink).await
        }
        Command::Pending {
            channel,
            all,
            output,
        } => {
            let store =
                commands::open_store(&commands::resolve_db_path(cli.db.as_deref(), config.as_ref()))?;
            commands::pending::run(store, &channel, all, output, &mut io::stdout()).await
        }
        Command::Reset { channel } => {
            let store =
                commands::open_store(&commands::resolve_db_path(cli.db.as_deref(), config.as_ref()))?;
            commands::reset::run(store, &channel, &mut io::stdout()).await
        }
        Command::Sweep { channels } => {
            let store =
                commands::open_store(&commands::resolve_db_path(cli.db.as_deref(), config.as_ref()))?;
            let retention = config
                .as_ref()
                .map_or_else(|| ConnectionConfig::default().retention, Config::retention);
            commands::sweep::run(
                store,
                Arc::new(SystemClock),
                &channels,
                retention,
                &mut io::stdout(),
            )
            .await
            .map(|_| ())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
