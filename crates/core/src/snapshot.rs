// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Locally cached channel snapshots.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::ClockSource;
use crate::error::Result;
use crate::store::{Collection, KeyValueStore};

/// Default lifetime of a cached snapshot.
pub const DEFAULT_SNAPSHOT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Last known server state for a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSnapshot {
    pub channel_key: String,
    pub payload: Value,
    pub captured_at: u64,
    pub expires_at: u64,
}

impl CachedSnapshot {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }
}

/// Snapshot cache in the `cache` collection, keyed by channel.
#[derive(Clone)]
pub struct SnapshotCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn ClockSource>,
    ttl: Duration,
}

impl SnapshotCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn ClockSource>, ttl: Duration) -> Self {
        SnapshotCache { store, clock, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached snapshot, expired or not.
    pub async fn get(&self, channel_key: &str) -> Result<Option<CachedSnapshot>> {
        match self.store.get(Collection::Cache, channel_key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// The cached snapshot if it has not expired.
    pub async fn get_fresh(&self, channel_key: &str) -> Result<Option<CachedSnapshot>> {
        let now = self.clock.now_ms();
        Ok(self
            .get(channel_key)
            .await?
            .filter(|snapshot| !snapshot.is_expired(now)))
    }

    /// Stores `payload` as the channel's snapshot, captured now.
    pub async fn put(&self, channel_key: &str, payload: Value) -> Result<CachedSnapshot> {
        let now = self.clock.now_ms();
        let ttl_ms = u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX);
        let snapshot = CachedSnapshot {
            channel_key: channel_key.to_string(),
            payload,
            captured_at: now,
            expires_at: now.saturating_add(ttl_ms),
        };
        self.store
            .put(Collection::Cache, channel_key, serde_json::to_value(&snapshot)?)
            .await?;
        Ok(snapshot)
    }

    pub async fn remove(&self, channel_key: &str) -> Result<bool> {
        self.store.delete(Collection::Cache, channel_key).await
    }

    /// Deletes every expired snapshot, for all channels.
    ///
    /// Entries that fail to decode are deleted as well.
    pub async fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now_ms();
        let mut purged = 0;
        for (key, value) in self.store.get_all(Collection::Cache).await? {
            let expired = match serde_json::from_value::<CachedSnapshot>(value) {
                Ok(snapshot) => snapshot.is_expired(now),
                Err(_) => true,
            };
            if expired && self.store.delete(Collection::Cache, &key).await? {
                purged += 1;
            }
        }
        Ok(purged)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
