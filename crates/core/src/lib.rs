// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! sluice-core: transport-independent pieces of the sluice subscription client.
//!
//! This crate holds the data model, storage and policy types used by the
//! `sluice` runtime: events and frame parsing, the connection state table,
//! reconnect backoff, durable queues, resume tokens, snapshot caching and
//! conflict resolution.

pub mod backoff;
pub mod clock;
pub mod conflict;
pub mod error;
pub mod event;
pub mod queue;
pub mod resume;
pub mod snapshot;
pub mod sqlite;
pub mod state;
pub mod store;

pub use backoff::BackoffPolicy;
pub use clock::{ClockSource, ManualClock, SystemClock};
pub use conflict::{ConflictResolver, ConflictStrategy, Resolution, Resolved, ShallowMerge};
pub use error::{Error, ErrorCode, ErrorReport, Result};
pub use event::{parse_frame, Event, EventIdGenerator, EventType, Frame};
pub use queue::{EventQueue, PendingEvent};
pub use resume::{ResumeToken, ResumeTokenStore};
pub use snapshot::{CachedSnapshot, SnapshotCache, DEFAULT_SNAPSHOT_TTL};
pub use sqlite::SqliteStore;
pub use state::ConnectionState;
pub use store::{Collection, KeyValueStore, MemoryStore};
