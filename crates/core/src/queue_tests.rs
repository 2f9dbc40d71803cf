// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the offline event queue.

#![allow(clippy::unwrap_used)]

use super::*;
use crate::clock::ManualClock;
use crate::event::EventType;
use crate::store::MemoryStore;
use serde_json::json;

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

fn make_event(id: &str) -> Event {
    Event::new(id, EventType::Updated, 1_000, "acme", json!({ "id": id }))
}

async fn open_queue(store: &MemoryStore, clock: &Arc<ManualClock>) -> EventQueue {
    EventQueue::open(Arc::new(store.clone()), clock.clone(), "acme")
        .await
        .unwrap()
}

fn ids(events: &[Event]) -> Vec<&str> {
    events.iter().map(|e| e.id.as_str()).collect()
}

#[tokio::test]
async fn enqueue_and_drain_in_order() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(0));
    let mut queue = open_queue(&store, &clock).await;

    assert!(!queue.has_pending());

    for id in ["evt-1", "evt-2", "evt-3"] {
        queue.enqueue(make_event(id)).await.unwrap();
    }

    assert!(queue.has_pending());
    assert_eq!(queue.pending_len(), 3);
    assert_eq!(ids(&queue.drain().await.unwrap()), vec!["evt-1", "evt-2", "evt-3"]);

    // drain does not remove anything
    assert_eq!(queue.drain().await.unwrap().len(), 3);
}

#[tokio::test]
async fn order_survives_more_than_nine_entries() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(0));
    let mut queue = open_queue(&store, &clock).await;

    for i in 0..12 {
        queue.enqueue(make_event(&format!("evt-{i}"))).await.unwrap();
    }

    let drained = queue.drain().await.unwrap();
    let expected: Vec<String> = (0..12).map(|i| format!("evt-{i}")).collect();
    assert_eq!(drained.iter().map(|e| e.id.clone()).collect::<Vec<_>>(), expected);
}

#[tokio::test]
async fn mark_synced_hides_entries_from_drain() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(0));
    let mut queue = open_queue(&store, &clock).await;

    queue.enqueue(make_event("evt-1")).await.unwrap();
    queue.enqueue(make_event("evt-2")).await.unwrap();

    let marked = queue.mark_synced(&["evt-1".to_string()]).await.unwrap();
    assert_eq!(marked, 1);
    assert_eq!(ids(&queue.drain().await.unwrap()), vec!["evt-2"]);

    // synced entries stay stored until purged
    assert_eq!(store.len(Collection::PendingEvents), 2);
    assert_eq!(queue.pending_len(), 1);
}

#[tokio::test]
async fn purge_only_removes_old_synced_entries() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(0));
    let mut queue = open_queue(&store, &clock).await;

    queue.enqueue(make_event("old-synced")).await.unwrap();
    queue.enqueue(make_event("old-unsynced")).await.unwrap();
    clock.set(6 * DAY_MS);
    queue.enqueue(make_event("young-synced")).await.unwrap();
    queue
        .mark_synced(&["old-synced".to_string(), "young-synced".to_string()])
        .await
        .unwrap();

    clock.set(8 * DAY_MS);
    let purged = queue
        .purge_synced(Duration::from_millis(7 * DAY_MS))
        .await
        .unwrap();

    assert_eq!(purged, 1);
    let remaining: Vec<String> = queue
        .entries()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.event.id)
        .collect();
    assert_eq!(remaining, vec!["old-unsynced", "young-synced"]);
}

#[tokio::test]
async fn persistence_across_reopen() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(0));

    {
        let mut queue = open_queue(&store, &clock).await;
        queue.enqueue(make_event("evt-1")).await.unwrap();
        queue.enqueue(make_event("evt-2")).await.unwrap();
    }

    let mut queue = open_queue(&store, &clock).await;
    assert_eq!(queue.pending_len(), 2);

    // numbering continues after the persisted entries
    let seq = queue.enqueue(make_event("evt-3")).await.unwrap();
    assert_eq!(seq, 2);
    assert_eq!(ids(&queue.drain().await.unwrap()), vec!["evt-1", "evt-2", "evt-3"]);
}

#[tokio::test]
async fn channels_do_not_mix() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(0));
    let mut acme = open_queue(&store, &clock).await;
    let mut globex = EventQueue::open(Arc::new(store.clone()), clock.clone(), "globex")
        .await
        .unwrap();

    acme.enqueue(make_event("a-1")).await.unwrap();
    let mut other = make_event("g-1");
    other.channel_key = "globex".to_string();
    globex.enqueue(other).await.unwrap();

    assert_eq!(ids(&acme.drain().await.unwrap()), vec!["a-1"]);
    assert_eq!(ids(&globex.drain().await.unwrap()), vec!["g-1"]);
}

#[tokio::test]
async fn storage_failure_keeps_event_in_memory() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(0));
    let mut queue = open_queue(&store, &clock).await;

    queue.enqueue(make_event("evt-1")).await.unwrap();
    store.set_unavailable(true);
    assert!(queue.enqueue(make_event("evt-2")).await.is_err());
    store.set_unavailable(false);
    queue.enqueue(make_event("evt-3")).await.unwrap();

    assert_eq!(queue.pending_len(), 3);
    assert_eq!(ids(&queue.drain().await.unwrap()), vec!["evt-1", "evt-2", "evt-3"]);

    queue
        .mark_synced(&["evt-1".to_string(), "evt-2".to_string(), "evt-3".to_string()])
        .await
        .unwrap();
    assert!(!queue.has_pending());
}

#[tokio::test]
async fn memory_entries_drain_while_store_is_down() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(0));
    let mut queue = open_queue(&store, &clock).await;

    store.set_unavailable(true);
    assert!(queue.enqueue(make_event("evt-1")).await.is_err());
    assert!(queue.enqueue(make_event("evt-2")).await.is_err());

    assert_eq!(ids(&queue.drain().await.unwrap()), vec!["evt-1", "evt-2"]);
    let marked = queue
        .mark_synced(&["evt-1".to_string(), "evt-2".to_string()])
        .await
        .unwrap();
    assert_eq!(marked, 2);
    assert!(!queue.has_pending());
}

#[tokio::test]
async fn drain_fails_while_persisted_entries_are_unreadable() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(0));
    let mut queue = open_queue(&store, &clock).await;

    queue.enqueue(make_event("evt-1")).await.unwrap();
    store.set_unavailable(true);
    assert!(queue.enqueue(make_event("evt-2")).await.is_err());

    assert!(queue.drain().await.is_err());
    assert_eq!(queue.pending_len(), 2);
}

#[tokio::test]
async fn unreadable_entries_are_skipped_not_deleted() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(0));
    store
        .put(Collection::PendingEvents, "acme/garbage", json!("nope"))
        .await
        .unwrap();

    let mut queue = open_queue(&store, &clock).await;
    queue.enqueue(make_event("evt-1")).await.unwrap();

    assert_eq!(ids(&queue.drain().await.unwrap()), vec!["evt-1"]);
    assert_eq!(store.len(Collection::PendingEvents), 2);
}

#[tokio::test]
async fn pending_event_wire_format() {
    let pending = PendingEvent {
        event: make_event("evt-1"),
        seq: 4,
        stored_at: 77,
        synced: false,
    };
    let value = serde_json::to_value(&pending).unwrap();

    assert_eq!(value["id"], "evt-1");
    assert_eq!(value["type"], "updated");
    assert_eq!(value["channelKey"], "acme");
    assert_eq!(value["storedAt"], 77);
    assert_eq!(value["synced"], false);
}
