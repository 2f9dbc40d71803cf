// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Keeps one connection manager per channel.

use std::collections::BTreeMap;

use sluice_core::ConnectionState;

use crate::connection::ConnectionHandle;

/// Handles for the running managers, keyed by channel.
#[derive(Default)]
pub struct ClientRegistry {
    clients: BTreeMap<String, ConnectionHandle>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handle` under its channel key.
    ///
    /// A manager already registered for the channel is shut down and its
    /// handle returned.
    pub fn insert(&mut self, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let previous = self.clients.insert(handle.channel_key().to_string(), handle);
        if let Some(previous) = &previous {
            tracing::info!(channel = previous.channel_key(), "replacing connection manager");
            previous.shutdown();
        }
        previous
    }

    pub fn get(&self, channel_key: &str) -> Option<&ConnectionHandle> {
        self.clients.get(channel_key)
    }

    /// Unregisters and shuts down the channel's manager.
    pub fn remove(&mut self, channel_key: &str) -> Option<ConnectionHandle> {
        let handle = self.clients.remove(channel_key)?;
        handle.shutdown();
        Some(handle)
    }

    pub fn channels(&self) -> Vec<&str> {
        self.clients.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn states(&self) -> Vec<(String, ConnectionState)> {
        self.clients
            .iter()
            .map(|(channel, handle)| (channel.clone(), handle.state()))
            .collect()
    }

    pub fn connect_all(&self) {
        for handle in self.clients.values() {
            if let Err(e) = handle.connect() {
                tracing::warn!(channel = handle.channel_key(), "connect failed: {e}");
            }
        }
    }

    pub fn disconnect_all(&self) {
        for handle in self.clients.values() {
            if let Err(e) = handle.disconnect() {
                tracing::debug!(channel = handle.channel_key(), "disconnect skipped: {e}");
            }
        }
    }

    /// Stops every manager and empties the registry.
    pub fn shutdown_all(&mut self) {
        for (_, handle) in std::mem::take(&mut self.clients) {
            handle.shutdown();
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
