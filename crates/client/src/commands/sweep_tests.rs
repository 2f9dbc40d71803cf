// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use sluice_core::{Event, EventType, ManualClock, MemoryStore};

const DAY_MS: u64 = 24 * 60 * 60 * 1_000;
const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

async fn queue_synced(store: &MemoryStore, clock: &Arc<ManualClock>, channel: &str, id: &str) {
    let clock = Arc::clone(clock) as Arc<dyn ClockSource>;
    let mut queue = EventQueue::open(Arc::new(store.clone()), clock, channel)
        .await
        .unwrap();
    queue
        .enqueue(Event::new(id, EventType::Created, 0, channel, json!({})))
        .await
        .unwrap();
    queue.mark_synced(&[id.to_string()]).await.unwrap();
}

async fn sweep(
    store: &MemoryStore,
    clock: &Arc<ManualClock>,
    channels: &[&str],
) -> (SweepReport, String) {
    let channels: Vec<String> = channels.iter().map(|c| c.to_string()).collect();
    let mut out = Vec::new();
    let report = run(
        Arc::new(store.clone()),
        Arc::clone(clock) as Arc<dyn ClockSource>,
        &channels,
        WEEK,
        &mut out,
    )
    .await
    .unwrap();
    (report, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn sweeps_every_queued_channel_by_default() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    queue_synced(&store, &clock, "acme", "a-1").await;
    queue_synced(&store, &clock, "globex", "g-1").await;
    clock.advance(8 * DAY_MS);

    let (report, text) = sweep(&store, &clock, &[]).await;

    assert_eq!(report.events_purged, 2);
    assert_eq!(store.len(Collection::PendingEvents), 0);
    assert_eq!(text, "Purged 0 expired snapshot(s) and 2 synced event(s)\n");
}

#[tokio::test]
async fn named_channels_limit_the_sweep() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    queue_synced(&store, &clock, "acme", "a-1").await;
    queue_synced(&store, &clock, "globex", "g-1").await;
    clock.advance(8 * DAY_MS);

    let (report, _) = sweep(&store, &clock, &["acme"]).await;

    assert_eq!(report.events_purged, 1);
    assert_eq!(store.len(Collection::PendingEvents), 1);
}

#[tokio::test]
async fn expired_snapshots_go_even_without_queued_events() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let cache = SnapshotCache::new(
        Arc::new(store.clone()),
        Arc::clone(&clock) as Arc<dyn ClockSource>,
        DEFAULT_SNAPSHOT_TTL,
    );
    cache.put("acme", json!({"v": 1})).await.unwrap();
    clock.advance(DAY_MS);

    let (report, text) = sweep(&store, &clock, &[]).await;

    assert_eq!(report.snapshots_purged, 1);
    assert!(report.is_clean());
    assert!(text.starts_with("Purged 1 expired snapshot(s)"));
}

#[tokio::test]
async fn recent_events_are_kept() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    queue_synced(&store, &clock, "acme", "a-1").await;
    clock.advance(DAY_MS);

    let (report, _) = sweep(&store, &clock, &["acme"]).await;

    assert_eq!(report.events_purged, 0);
    assert_eq!(store.len(Collection::PendingEvents), 1);
}
