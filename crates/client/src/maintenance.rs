// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic cleanup of persisted client state.

use std::time::Duration;

use serde::Serialize;

use sluice_core::{EventQueue, SnapshotCache};

/// Counts from one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub snapshots_purged: usize,
    pub events_purged: usize,
    /// Messages for the steps that failed.
    pub failures: Vec<String>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Deletes expired snapshots and synced queue entries past retention.
#[derive(Debug, Clone, Copy)]
pub struct Maintenance {
    retention: Duration,
}

impl Maintenance {
    pub fn new(retention: Duration) -> Self {
        Self { retention }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Runs one sweep. Failures are logged and recorded in the report;
    /// one failing step does not stop the other.
    pub async fn sweep(&self, queue: &mut EventQueue, cache: &SnapshotCache) -> SweepReport {
        let mut report = SweepReport::default();

        match cache.purge_expired().await {
            Ok(n) => report.snapshots_purged = n,
            Err(e) => {
                tracing::warn!("snapshot sweep failed: {e}");
                report.failures.push(e.to_string());
            }
        }

        match queue.purge_synced(self.retention).await {
            Ok(n) => report.events_purged = n,
            Err(e) => {
                tracing::warn!(channel = queue.channel_key(), "queue sweep failed: {e}");
                report.failures.push(e.to_string());
            }
        }

        report
    }
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
