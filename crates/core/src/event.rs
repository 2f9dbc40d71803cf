// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Delivered events and the stream frame format.
//!
//! The server pushes one JSON object per frame:
//!
//! ```text
//! { "id": "evt-42", "type": "updated", "timestamp": 1700000000000,
//!   "channelKey": "acme", "payload": { ... } }
//! ```
//!
//! `id`, `timestamp` and `channelKey` may be omitted; the client fills them in.
//! `{"type": "heartbeat"}` keeps the stream alive and is never delivered.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};

/// The closed set of business event types a channel can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Created,
    Updated,
    Deleted,
    Notification,
    /// Server hint that cached state is stale and should be re-fetched.
    SyncRequired,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Created => "created",
            EventType::Updated => "updated",
            EventType::Deleted => "deleted",
            EventType::Notification => "notification",
            EventType::SyncRequired => "sync_required",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "created" => Ok(EventType::Created),
            "updated" => Ok(EventType::Updated),
            "deleted" => Ok(EventType::Deleted),
            "notification" => Ok(EventType::Notification),
            "sync_required" => Ok(EventType::SyncRequired),
            _ => Err(Error::Parse(format!("unknown event type '{s}'"))),
        }
    }
}

/// A business event delivered on a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Stable across redelivery.
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Milliseconds since Unix epoch.
    pub timestamp: u64,
    pub channel_key: String,
    /// Opaque to the client.
    #[serde(default)]
    pub payload: Value,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        event_type: EventType,
        timestamp: u64,
        channel_key: impl Into<String>,
        payload: Value,
    ) -> Self {
        Event {
            id: id.into(),
            event_type,
            timestamp,
            channel_key: channel_key.into(),
            payload,
        }
    }
}

/// A decoded stream frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Event(Event),
    Heartbeat,
}

/// Wire shape before defaults are applied.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    timestamp: Option<u64>,
    #[serde(default)]
    channel_key: Option<String>,
    #[serde(default)]
    payload: Value,
}

/// Decodes one text frame received on `channel_key`.
///
/// Missing ids are generated by `ids`, a missing timestamp becomes `now_ms`
/// and a missing channel key becomes `channel_key`. A frame addressed to a
/// different channel is rejected.
pub fn parse_frame(
    text: &str,
    channel_key: &str,
    ids: &EventIdGenerator,
    now_ms: u64,
) -> Result<Frame> {
    let envelope: Envelope =
        serde_json::from_str(text).map_err(|e| Error::Parse(e.to_string()))?;

    if envelope.kind == "heartbeat" {
        return Ok(Frame::Heartbeat);
    }
    let event_type: EventType = envelope.kind.parse()?;

    let id = match envelope.id {
        Some(id) if !id.trim().is_empty() => id,
        _ => ids.next_id(now_ms),
    };

    let channel = envelope
        .channel_key
        .unwrap_or_else(|| channel_key.to_string());
    if channel != channel_key {
        return Err(Error::ChannelMismatch {
            id,
            expected: channel_key.to_string(),
            got: channel,
        });
    }

    Ok(Frame::Event(Event {
        id,
        event_type,
        timestamp: envelope.timestamp.unwrap_or(now_ms),
        channel_key: channel,
        payload: envelope.payload,
    }))
}

/// Generates ids for events the server sent without one.
///
/// Format: `c{now_ms}-{counter}-{suffix}`. The counter is monotonic for the
/// lifetime of the generator and the random suffix keeps ids unique across
/// processes that start with the same counter.
#[derive(Debug, Default)]
pub struct EventIdGenerator {
    counter: AtomicU64,
}

impl EventIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self, now_ms: u64) -> String {
        let counter = self.counter.fetch_add(1, Ordering::SeqCst);
        let suffix: u32 = rand::random();
        format!("c{now_ms}-{counter:06}-{suffix:08x}")
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
