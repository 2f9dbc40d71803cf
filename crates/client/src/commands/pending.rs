// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use sluice_core::{EventQueue, KeyValueStore, PendingEvent, Result, SystemClock};

use crate::cli::OutputFormat;

/// Prints the queue for `channel`, oldest first.
pub async fn run(
    store: Arc<dyn KeyValueStore>,
    channel: &str,
    all: bool,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let queue = EventQueue::open(store, Arc::new(SystemClock), channel).await?;
    let entries: Vec<PendingEvent> = queue
        .entries()
        .await?
        .into_iter()
        .filter(|p| all || !p.synced)
        .collect();

    match format {
        OutputFormat::Json => {
            for entry in &entries {
                writeln!(out, "{}", serde_json::to_string(entry)?)?;
            }
        }
        OutputFormat::Text => {
            if entries.is_empty() {
                writeln!(out, "No pending events for '{}'", channel)?;
                return Ok(());
            }
            for entry in &entries {
                writeln!(out, "{}", format_line(entry))?;
            }
        }
    }
    Ok(())
}

fn format_line(entry: &PendingEvent) -> String {
    let stored = i64::try_from(entry.stored_at)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| entry.stored_at.to_string());
    let mut line = format!(
        "{:>6}  {}  {:<13}  {}",
        entry.seq,
        stored,
        entry.event.event_type.as_str(),
        entry.event.id
    );
    if entry.synced {
        line.push_str("  (synced)");
    }
    line
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
