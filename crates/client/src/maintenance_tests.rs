// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use sluice_core::{
    ClockSource, Collection, Event, EventType, ManualClock, MemoryStore, DEFAULT_SNAPSHOT_TTL,
};
use std::sync::Arc;

const DAY_MS: u64 = 24 * 60 * 60 * 1_000;
const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

struct Fixture {
    store: MemoryStore,
    clock: Arc<ManualClock>,
    queue: EventQueue,
    cache: SnapshotCache,
}

async fn fixture() -> Fixture {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let dyn_clock = Arc::clone(&clock) as Arc<dyn ClockSource>;
    let queue = EventQueue::open(Arc::new(store.clone()), Arc::clone(&dyn_clock), "acme")
        .await
        .unwrap();
    let cache = SnapshotCache::new(Arc::new(store.clone()), dyn_clock, DEFAULT_SNAPSHOT_TTL);
    Fixture {
        store,
        clock,
        queue,
        cache,
    }
}

fn event(id: &str) -> Event {
    Event::new(id, EventType::Updated, 0, "acme", json!({}))
}

#[tokio::test]
async fn sweep_purges_only_old_synced_events() {
    let mut f = fixture().await;
    f.queue.enqueue(event("old-synced")).await.unwrap();
    f.queue.enqueue(event("old-pending")).await.unwrap();
    f.queue.mark_synced(&["old-synced".to_string()]).await.unwrap();

    f.clock.advance(8 * DAY_MS);
    f.queue.enqueue(event("new")).await.unwrap();
    f.queue.mark_synced(&["new".to_string()]).await.unwrap();

    let report = Maintenance::new(WEEK).sweep(&mut f.queue, &f.cache).await;

    assert_eq!(report.events_purged, 1);
    assert!(report.is_clean());
    let remaining: Vec<String> = f
        .queue
        .entries()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.event.id)
        .collect();
    assert_eq!(remaining, vec!["old-pending", "new"]);
}

#[tokio::test]
async fn sweep_purges_expired_snapshots() {
    let mut f = fixture().await;
    f.cache.put("acme", json!({"v": 1})).await.unwrap();
    f.cache.put("globex", json!({"v": 1})).await.unwrap();

    let report = Maintenance::new(WEEK).sweep(&mut f.queue, &f.cache).await;
    assert_eq!(report.snapshots_purged, 0);

    f.clock.advance(DAY_MS + 1);
    let report = Maintenance::new(WEEK).sweep(&mut f.queue, &f.cache).await;
    assert_eq!(report.snapshots_purged, 2);
    assert_eq!(f.store.len(Collection::Cache), 0);
}

#[tokio::test]
async fn failures_are_reported_not_raised() {
    let mut f = fixture().await;
    f.store.set_unavailable(true);

    let report = Maintenance::new(WEEK).sweep(&mut f.queue, &f.cache).await;

    assert_eq!(report.failures.len(), 2);
    assert!(!report.is_clean());
    assert_eq!(report.events_purged, 0);
}

#[test]
fn retention_is_kept() {
    assert_eq!(Maintenance::new(WEEK).retention(), WEEK);
}
