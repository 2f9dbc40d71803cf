// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::sync::Arc;

use sluice_core::{KeyValueStore, Result, ResumeTokenStore, SystemClock};

/// Deletes the resume token so the next subscription starts from now.
pub async fn run(store: Arc<dyn KeyValueStore>, channel: &str, out: &mut impl Write) -> Result<()> {
    let tokens = ResumeTokenStore::new(store, Arc::new(SystemClock));
    let previous = tokens.load(channel).await?;

    if tokens.reset(channel).await? {
        match previous {
            Some(token) => writeln!(
                out,
                "Reset '{}' (was at {})",
                channel, token.last_event_id
            )?,
            None => writeln!(out, "Reset '{}'", channel)?,
        }
    } else {
        writeln!(out, "No resume token stored for '{}'", channel)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "reset_tests.rs"]
mod tests;
