// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed [`KeyValueStore`].
//!
//! All three collections live in one table keyed by `(collection, key)`.
//! Values are stored as JSON text alongside their last write time.

use futures_util::future::{self, BoxFuture};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::clock::{ClockSource, SystemClock};
use crate::error::Result;
use crate::store::{Collection, KeyValueStore};

/// SQL schema for the store.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    collection TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (collection, key)
);
"#;

/// Durable store on a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn ClockSource>,
}

impl SqliteStore {
    /// Opens or creates the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| crate::Error::Storage(e.to_string()))?;
            }
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replaces the clock used for `updated_at`.
    pub fn with_clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Write time of an entry, if present.
    pub fn updated_at(&self, collection: Collection, key: &str) -> Result<Option<u64>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let at: Option<i64> = conn
            .query_row(
                "SELECT updated_at FROM kv WHERE collection = ?1 AND key = ?2",
                params![collection.as_str(), key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(at.map(|ms| u64::try_from(ms).unwrap_or(0)))
    }

    fn get_sync(&self, collection: Collection, key: &str) -> Result<Option<Value>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let text: Option<String> = conn
            .query_row(
                "SELECT value FROM kv WHERE collection = ?1 AND key = ?2",
                params![collection.as_str(), key],
                |row| row.get(0),
            )
            .optional()?;
        match text {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn put_sync(&self, collection: Collection, key: &str, value: &Value) -> Result<()> {
        let text = serde_json::to_string(value)?;
        let now = i64::try_from(self.clock.now_ms()).unwrap_or(i64::MAX);
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT INTO kv (collection, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(collection, key) DO UPDATE SET value = excluded.value,
                                                       updated_at = excluded.updated_at",
            params![collection.as_str(), key, text, now],
        )?;
        Ok(())
    }

    fn delete_sync(&self, collection: Collection, key: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let removed = conn.execute(
            "DELETE FROM kv WHERE collection = ?1 AND key = ?2",
            params![collection.as_str(), key],
        )?;
        Ok(removed > 0)
    }

    fn get_all_sync(&self, collection: Collection) -> Result<Vec<(String, Value)>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt =
            conn.prepare("SELECT key, value FROM kv WHERE collection = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![collection.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (key, text) = row?;
            match serde_json::from_str(&text) {
                Ok(value) => entries.push((key, value)),
                Err(e) => tracing::warn!(
                    collection = collection.as_str(),
                    key = %key,
                    "skipping unreadable row: {e}"
                ),
            }
        }
        Ok(entries)
    }
}

impl KeyValueStore for SqliteStore {
    fn get<'a>(
        &'a self,
        collection: Collection,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<Value>>> {
        Box::pin(future::ready(self.get_sync(collection, key)))
    }

    fn put<'a>(
        &'a self,
        collection: Collection,
        key: &'a str,
        value: Value,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(future::ready(self.put_sync(collection, key, &value)))
    }

    fn delete<'a>(&'a self, collection: Collection, key: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(future::ready(self.delete_sync(collection, key)))
    }

    fn get_all(&self, collection: Collection) -> BoxFuture<'_, Result<Vec<(String, Value)>>> {
        Box::pin(future::ready(self.get_all_sync(collection)))
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
