// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict resolution between a cached snapshot and a fresh server snapshot.
//!
//! Strategies:
//! - `server-wins`: keep the fetched snapshot, discard the cache (default)
//! - `client-wins`: keep the cache, discard the fetched snapshot
//! - `merge`: combine both with a resolver function
//! - `manual`: hand both to a caller-supplied resolver (e.g. a user prompt)

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Combines a server snapshot with the locally cached one.
pub trait ConflictResolver: Send + Sync {
    fn resolve(&self, server: &Value, client: &Value) -> Value;
}

impl<F> ConflictResolver for F
where
    F: Fn(&Value, &Value) -> Value + Send + Sync,
{
    fn resolve(&self, server: &Value, client: &Value) -> Value {
        self(server, client)
    }
}

/// Object union where server keys override client keys.
///
/// Non-object snapshots resolve to the server value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShallowMerge;

impl ConflictResolver for ShallowMerge {
    fn resolve(&self, server: &Value, client: &Value) -> Value {
        match (server, client) {
            (Value::Object(server), Value::Object(client)) => {
                let mut merged = client.clone();
                for (key, value) in server {
                    merged.insert(key.clone(), value.clone());
                }
                Value::Object(merged)
            }
            _ => server.clone(),
        }
    }
}

/// Which side a reconciliation kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    ServerWins,
    ClientWins,
    Merged,
    Manual,
}

/// Result of applying a strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub payload: Value,
    pub resolution: Resolution,
}

/// Caller-selected reconciliation policy.
#[derive(Clone, Default)]
pub enum ConflictStrategy {
    #[default]
    ServerWins,
    ClientWins,
    Merge(Arc<dyn ConflictResolver>),
    Manual(Arc<dyn ConflictResolver>),
}

impl ConflictStrategy {
    pub fn merge(resolver: impl ConflictResolver + 'static) -> Self {
        ConflictStrategy::Merge(Arc::new(resolver))
    }

    pub fn manual(resolver: impl ConflictResolver + 'static) -> Self {
        ConflictStrategy::Manual(Arc::new(resolver))
    }

    /// Looks up a strategy by its configuration name.
    ///
    /// `merge` uses [`ShallowMerge`]. `manual` needs a resolver and cannot be
    /// built from a name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "server-wins" => Ok(ConflictStrategy::ServerWins),
            "client-wins" => Ok(ConflictStrategy::ClientWins),
            "merge" => Ok(ConflictStrategy::merge(ShallowMerge)),
            "manual" => Err(Error::Config(
                "the manual strategy needs a resolver supplied in code".to_string(),
            )),
            _ => Err(Error::Config(format!(
                "unknown conflict strategy '{name}'\n  hint: valid strategies are: server-wins, client-wins, merge"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConflictStrategy::ServerWins => "server-wins",
            ConflictStrategy::ClientWins => "client-wins",
            ConflictStrategy::Merge(_) => "merge",
            ConflictStrategy::Manual(_) => "manual",
        }
    }

    /// Picks the snapshot to keep.
    pub fn resolve(&self, server: Value, client: Value) -> Resolved {
        match self {
            ConflictStrategy::ServerWins => Resolved {
                payload: server,
                resolution: Resolution::ServerWins,
            },
            ConflictStrategy::ClientWins => Resolved {
                payload: client,
                resolution: Resolution::ClientWins,
            },
            ConflictStrategy::Merge(resolver) => Resolved {
                payload: resolver.resolve(&server, &client),
                resolution: Resolution::Merged,
            },
            ConflictStrategy::Manual(resolver) => Resolved {
                payload: resolver.resolve(&server, &client),
                resolution: Resolution::Manual,
            },
        }
    }
}

impl fmt::Debug for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConflictStrategy").field(&self.name()).finish()
    }
}

#[cfg(test)]
#[path = "conflict_tests.rs"]
mod tests;
