// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-channel resume token persistence.
//!
//! The token is the id of the last event the client processed on a channel.
//! It is written before the event reaches the consumer and sent with every
//! subscription so the server can replay what was missed. Tokens live in the
//! `metadata` collection under `resume:{channel}`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::ClockSource;
use crate::error::Result;
use crate::store::{Collection, KeyValueStore};

/// The last processed event on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeToken {
    pub channel_key: String,
    pub last_event_id: String,
    /// Write time in milliseconds since Unix epoch.
    #[serde(default)]
    pub updated_at: u64,
}

/// Reads and writes resume tokens.
#[derive(Clone)]
pub struct ResumeTokenStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn ClockSource>,
}

impl ResumeTokenStore {
    pub const KEY_PREFIX: &'static str = "resume:";

    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn ClockSource>) -> Self {
        ResumeTokenStore { store, clock }
    }

    /// Metadata key holding the token for `channel_key`.
    pub fn key(channel_key: &str) -> String {
        format!("{}{channel_key}", Self::KEY_PREFIX)
    }

    /// Reads the token for a channel.
    ///
    /// An unreadable record is treated as absent: the subscription then
    /// starts "from now" rather than failing.
    pub async fn load(&self, channel_key: &str) -> Result<Option<ResumeToken>> {
        let key = Self::key(channel_key);
        let Some(value) = self.store.get(Collection::Metadata, &key).await? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                tracing::warn!(channel = channel_key, "ignoring unreadable resume token: {e}");
                Ok(None)
            }
        }
    }

    /// Overwrites the token for a channel with `event_id`.
    pub async fn record(&self, channel_key: &str, event_id: &str) -> Result<ResumeToken> {
        let token = ResumeToken {
            channel_key: channel_key.to_string(),
            last_event_id: event_id.to_string(),
            updated_at: self.clock.now_ms(),
        };
        let value = serde_json::to_value(&token)?;
        self.store
            .put(Collection::Metadata, &Self::key(channel_key), value)
            .await?;
        Ok(token)
    }

    /// Forgets the token so the next subscription starts from now.
    pub async fn reset(&self, channel_key: &str) -> Result<bool> {
        self.store
            .delete(Collection::Metadata, &Self::key(channel_key))
            .await
    }
}

#[cfg(test)]
#[path = "resume_tests.rs"]
mod tests;
