// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use sluice_core::{
    ClockSource, Collection, EventQueue, KeyValueStore, Result, SnapshotCache,
    DEFAULT_SNAPSHOT_TTL,
};

use crate::maintenance::{Maintenance, SweepReport};

/// Runs one maintenance sweep over `channels`, or over every channel with
/// queued events when none are given.
pub async fn run(
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn ClockSource>,
    channels: &[String],
    retention: Duration,
    out: &mut impl Write,
) -> Result<SweepReport> {
    let channels = if channels.is_empty() {
        queued_channels(store.as_ref()).await?
    } else {
        channels.iter().cloned().collect()
    };

    let cache = SnapshotCache::new(Arc::clone(&store), Arc::clone(&clock), DEFAULT_SNAPSHOT_TTL);
    let maintenance = Maintenance::new(retention);
    let mut total = SweepReport::default();

    if channels.is_empty() {
        total.snapshots_purged = cache.purge_expired().await?;
    }
    for channel in &channels {
        let mut queue = EventQueue::open(Arc::clone(&store), Arc::clone(&clock), channel).await?;
        let report = maintenance.sweep(&mut queue, &cache).await;
        total.snapshots_purged += report.snapshots_purged;
        total.events_purged += report.events_purged;
        total.failures.extend(report.failures);
    }

    writeln!(
        out,
        "Purged {} expired snapshot(s) and {} synced event(s)",
        total.snapshots_purged, total.events_purged
    )?;
    for failure in &total.failures {
        writeln!(out, "warning: {}", failure)?;
    }
    Ok(total)
}

/// Channel keys that have entries in the pending-events collection.
async fn queued_channels(store: &dyn KeyValueStore) -> Result<BTreeSet<String>> {
    Ok(store
        .get_all(Collection::PendingEvents)
        .await?
        .into_iter()
        .filter_map(|(key, _)| key.rsplit_once('/').map(|(channel, _)| channel.to_string()))
        .collect())
}

#[cfg(test)]
#[path = "sweep_tests.rs"]
mod tests;
