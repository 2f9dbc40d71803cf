// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable key-value storage abstraction.
//!
//! The core persists three logical collections through [`KeyValueStore`]:
//!
//! - `cache`: snapshots keyed by channel key
//! - `pendingEvents`: queued events keyed by `{channel}/{sequence}`
//! - `metadata`: small records such as resume tokens
//!
//! Operations are async so the store can sit on any backend. [`MemoryStore`]
//! backs tests; [`crate::SqliteStore`] is the durable implementation.

use futures_util::future::{self, BoxFuture};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

/// Logical collection inside a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Cache,
    PendingEvents,
    Metadata,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Cache,
        Collection::PendingEvents,
        Collection::Metadata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Cache => "cache",
            Collection::PendingEvents => "pendingEvents",
            Collection::Metadata => "metadata",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Async key-value store over named collections.
///
/// Callers serialize operations on the same key; implementations need not
/// guard against concurrent writers of one key.
pub trait KeyValueStore: Send + Sync {
    /// Reads one value.
    fn get<'a>(&'a self, collection: Collection, key: &'a str)
        -> BoxFuture<'a, Result<Option<Value>>>;

    /// Inserts or replaces one value.
    fn put<'a>(&'a self, collection: Collection, key: &'a str, value: Value)
        -> BoxFuture<'a, Result<()>>;

    /// Removes one value. Returns false if it did not exist.
    fn delete<'a>(&'a self, collection: Collection, key: &'a str) -> BoxFuture<'a, Result<bool>>;

    /// Returns every entry of a collection, ordered by key.
    fn get_all(&self, collection: Collection) -> BoxFuture<'_, Result<Vec<(String, Value)>>>;
}

type Collections = HashMap<Collection, BTreeMap<String, Value>>;

/// In-memory store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<Collections>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with a storage error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of entries in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        self.with_data(|data| data.get(&collection).map_or(0, BTreeMap::len))
    }

    fn with_data<T>(&self, f: impl FnOnce(&mut Collections) -> T) -> T {
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut data)
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::Storage("store unavailable".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get<'a>(
        &'a self,
        collection: Collection,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<Value>>> {
        let result = self.check().map(|()| {
            self.with_data(|data| data.get(&collection).and_then(|c| c.get(key)).cloned())
        });
        Box::pin(future::ready(result))
    }

    fn put<'a>(
        &'a self,
        collection: Collection,
        key: &'a str,
        value: Value,
    ) -> BoxFuture<'a, Result<()>> {
        let result = self.check().map(|()| {
            self.with_data(|data| {
                data.entry(collection)
                    .or_default()
                    .insert(key.to_string(), value);
            })
        });
        Box::pin(future::ready(result))
    }

    fn delete<'a>(&'a self, collection: Collection, key: &'a str) -> BoxFuture<'a, Result<bool>> {
        let result = self.check().map(|()| {
            self.with_data(|data| {
                data.get_mut(&collection)
                    .is_some_and(|c| c.remove(key).is_some())
            })
        });
        Box::pin(future::ready(result))
    }

    fn get_all(&self, collection: Collection) -> BoxFuture<'_, Result<Vec<(String, Value)>>> {
        let result = self.check().map(|()| {
            self.with_data(|data| {
                data.get(&collection)
                    .map(|c| c.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_default()
            })
        });
        Box::pin(future::ready(result))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
