// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Catch-up after a reconnect.
//!
//! Two jobs run when the client comes back:
//! - Flushing the event queue to the consumer in receipt order
//! - Fetching a fresh snapshot and reconciling it with the cached one

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;

use sluice_core::{ConflictStrategy, Error, Event, EventQueue, Resolution, Result, SnapshotCache};

/// Fetches the current server-side state of a channel.
pub trait SnapshotSource: Send + Sync {
    fn fetch<'a>(&'a self, channel_key: &'a str) -> BoxFuture<'a, Result<Value>>;
}

/// What a reconciliation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// No snapshot source is configured.
    Skipped,
    /// Nothing usable was cached, so the fetched snapshot was stored as is.
    Stored,
    /// A cached snapshot existed and the strategy picked the result.
    Reconciled(Resolution),
}

/// Flushes queued events and reconciles snapshots for one channel.
pub struct SyncCoordinator {
    cache: SnapshotCache,
    source: Option<Arc<dyn SnapshotSource>>,
    strategy: ConflictStrategy,
    fetch_timeout: Duration,
}

impl SyncCoordinator {
    pub fn new(cache: SnapshotCache) -> Self {
        Self {
            cache,
            source: None,
            strategy: ConflictStrategy::default(),
            fetch_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_source(mut self, source: Arc<dyn SnapshotSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_strategy(mut self, strategy: ConflictStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    pub fn strategy(&self) -> &ConflictStrategy {
        &self.strategy
    }

    /// Delivers every unsynced queued event in sequence order, then marks
    /// them synced.
    ///
    /// If marking fails the events stay pending and will be delivered again.
    pub async fn flush(
        &self,
        queue: &mut EventQueue,
        deliver: &mut (dyn FnMut(&Event) + Send),
    ) -> Result<usize> {
        let events = queue.drain().await?;
        if events.is_empty() {
            return Ok(0);
        }

        let mut ids = Vec::with_capacity(events.len());
        for event in &events {
            deliver(event);
            ids.push(event.id.clone());
        }
        queue.mark_synced(&ids).await?;
        Ok(events.len())
    }

    /// Fetches a fresh snapshot and reconciles it with the cache.
    ///
    /// Leaves the cache untouched when the fetch fails.
    pub async fn reconcile(&self, channel_key: &str) -> Result<SyncOutcome> {
        let Some(source) = &self.source else {
            return Ok(SyncOutcome::Skipped);
        };

        let fresh = match tokio::time::timeout(self.fetch_timeout, source.fetch(channel_key)).await
        {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e @ Error::SnapshotFetch(_))) => return Err(e),
            Ok(Err(e)) => return Err(Error::SnapshotFetch(e.to_string())),
            Err(_) => {
                return Err(Error::SnapshotFetch(format!(
                    "timed out after {} ms",
                    self.fetch_timeout.as_millis()
                )))
            }
        };

        let Some(cached) = self.cache.get_fresh(channel_key).await? else {
            self.cache.put(channel_key, fresh).await?;
            return Ok(SyncOutcome::Stored);
        };

        let resolved = self.strategy.resolve(fresh, cached.payload);
        if resolved.resolution != Resolution::ClientWins {
            self.cache.put(channel_key, resolved.payload).await?;
        }
        tracing::debug!(
            channel = channel_key,
            strategy = self.strategy.name(),
            "reconciled snapshot"
        );
        Ok(SyncOutcome::Reconciled(resolved.resolution))
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
