// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable, ordered buffer for events that could not be delivered yet.
//!
//! Events land here while the client is offline or before a consumer is
//! attached. Each entry is written to the `pendingEvents` collection under
//! `{channel}/{sequence}` as soon as it is accepted, and stays there until it
//! has been delivered (`synced`) and is older than the retention window.
//!
//! If the store rejects a write, the event is kept in a volatile in-memory
//! buffer instead so it is still delivered by this process, in sequence order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::ClockSource;
use crate::error::Result;
use crate::event::Event;
use crate::store::{Collection, KeyValueStore};

/// An event captured for later delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEvent {
    #[serde(flatten)]
    pub event: Event,
    /// Receipt order within the channel.
    pub seq: u64,
    /// Milliseconds since Unix epoch when the event was queued.
    pub stored_at: u64,
    /// True once the event has been handed to the consumer.
    pub synced: bool,
}

/// Offline queue for one channel.
pub struct EventQueue {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn ClockSource>,
    channel_key: String,
    next_seq: u64,
    /// Persisted entries not yet synced.
    unsynced: usize,
    /// Accepted entries the store refused to persist.
    volatile: Vec<PendingEvent>,
}

impl EventQueue {
    /// Opens the queue for `channel_key`, resuming its sequence numbering.
    pub async fn open(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn ClockSource>,
        channel_key: &str,
    ) -> Result<Self> {
        let mut queue = EventQueue {
            store,
            clock,
            channel_key: channel_key.to_string(),
            next_seq: 0,
            unsynced: 0,
            volatile: Vec::new(),
        };

        let entries = queue.load_entries().await?;
        queue.next_seq = entries.last().map_or(0, |(_, p)| p.seq + 1);
        queue.unsynced = entries.iter().filter(|(_, p)| !p.synced).count();
        Ok(queue)
    }

    /// An empty queue that has not read the store yet.
    ///
    /// Used when the store is unreachable at startup. Sequence numbers start
    /// from the clock so new entries sort after those written by earlier runs.
    pub fn detached(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn ClockSource>,
        channel_key: &str,
    ) -> Self {
        let next_seq = clock.now_ms().saturating_mul(1_000);
        EventQueue {
            store,
            clock,
            channel_key: channel_key.to_string(),
            next_seq,
            unsynced: 0,
            volatile: Vec::new(),
        }
    }

    pub fn channel_key(&self) -> &str {
        &self.channel_key
    }

    fn key(&self, seq: u64) -> String {
        format!("{}/{seq:020}", self.channel_key)
    }

    /// Returns true if any accepted event has not been marked synced.
    pub fn has_pending(&self) -> bool {
        self.unsynced > 0 || !self.volatile.is_empty()
    }

    /// Number of accepted events not yet marked synced.
    pub fn pending_len(&self) -> usize {
        self.unsynced + self.volatile.len()
    }

    /// Appends an event.
    ///
    /// On a storage failure the event is still accepted into the volatile
    /// buffer and the error is returned for reporting.
    pub async fn enqueue(&mut self, event: Event) -> Result<u64> {
        let seq = self.next_seq;
        self.next_seq += 1;

        let pending = PendingEvent {
            event,
            seq,
            stored_at: self.clock.now_ms(),
            synced: false,
        };

        let write = match serde_json::to_value(&pending) {
            Ok(value) => self.store.put(Collection::PendingEvents, &self.key(seq), value).await,
            Err(e) => Err(e.into()),
        };
        match write {
            Ok(()) => {
                self.unsynced += 1;
                Ok(seq)
            }
            Err(e) => {
                self.volatile.push(pending);
                Err(e)
            }
        }
    }

    /// Returns every unsynced event in receipt order without removing it.
    ///
    /// If the store cannot be read but holds nothing unsynced, the volatile
    /// entries are still returned.
    pub async fn drain(&mut self) -> Result<Vec<Event>> {
        let mut pending: Vec<PendingEvent> = match self.load_entries().await {
            Ok(entries) => entries
                .into_iter()
                .map(|(_, p)| p)
                .filter(|p| !p.synced)
                .collect(),
            Err(e) if self.unsynced == 0 && !self.volatile.is_empty() => {
                tracing::debug!(channel = %self.channel_key, "store unreadable, draining memory only: {e}");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        self.unsynced = pending.len();

        pending.extend(self.volatile.iter().cloned());
        pending.sort_by_key(|p| p.seq);
        Ok(pending.into_iter().map(|p| p.event).collect())
    }

    /// Marks delivered events as synced. Returns how many entries changed.
    pub async fn mark_synced(&mut self, ids: &[String]) -> Result<usize> {
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();

        let before = self.volatile.len();
        self.volatile.retain(|p| !ids.contains(p.event.id.as_str()));
        let mut marked = before - self.volatile.len();
        if self.unsynced == 0 {
            return Ok(marked);
        }

        for (key, mut pending) in self.load_entries().await? {
            if pending.synced || !ids.contains(pending.event.id.as_str()) {
                continue;
            }
            pending.synced = true;
            self.store
                .put(Collection::PendingEvents, &key, serde_json::to_value(&pending)?)
                .await?;
            self.unsynced = self.unsynced.saturating_sub(1);
            marked += 1;
        }
        Ok(marked)
    }

    /// Deletes synced entries stored more than `older_than` ago.
    pub async fn purge_synced(&mut self, older_than: Duration) -> Result<usize> {
        let age_ms = u64::try_from(older_than.as_millis()).unwrap_or(u64::MAX);
        let cutoff = self.clock.now_ms().saturating_sub(age_ms);

        let mut purged = 0;
        for (key, pending) in self.load_entries().await? {
            if pending.synced
                && pending.stored_at < cutoff
                && self.store.delete(Collection::PendingEvents, &key).await?
            {
                purged += 1;
            }
        }
        Ok(purged)
    }

    /// All persisted entries for this channel, synced or not, in receipt order.
    pub async fn entries(&self) -> Result<Vec<PendingEvent>> {
        Ok(self
            .load_entries()
            .await?
            .into_iter()
            .map(|(_, p)| p)
            .collect())
    }

    async fn load_entries(&self) -> Result<Vec<(String, PendingEvent)>> {
        let mut entries = Vec::new();
        for (key, value) in self.store.get_all(Collection::PendingEvents).await? {
            match serde_json::from_value::<PendingEvent>(value) {
                Ok(p) if p.event.channel_key == self.channel_key => entries.push((key, p)),
                Ok(_) => {}
                Err(e) => tracing::warn!(key = %key, "skipping unreadable pending event: {e}"),
            }
        }
        entries.sort_by_key(|(_, p)| p.seq);
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
