// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection state machine.
//!
//! ```text
//! disconnected ──connect()──► connecting ──open──► connected
//!      ▲                        │   ▲                  │
//!      │                 error/timeout  backoff fires  error/close
//!      │                        ▼   │                  ▼
//!  disconnect()               error ──────────► reconnecting
//!  (connecting, connected,      │
//!   reconnecting)               └──retries exhausted──► failed
//!
//! failed/disconnected ──reconnect()──► connecting
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// State of a channel subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    /// Transient: a failure is being handled.
    Error,
    /// Retries exhausted; only a manual reconnect leaves this state.
    Failed,
}

impl ConnectionState {
    pub const ALL: [ConnectionState; 6] = [
        ConnectionState::Disconnected,
        ConnectionState::Connecting,
        ConnectionState::Connected,
        ConnectionState::Reconnecting,
        ConnectionState::Error,
        ConnectionState::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Error => "error",
            ConnectionState::Failed => "failed",
        }
    }

    /// Returns true if the transition is in the state table.
    pub fn can_transition_to(&self, target: ConnectionState) -> bool {
        use ConnectionState as S;
        matches!(
            (self, target),
            (S::Disconnected | S::Failed | S::Reconnecting, S::Connecting)
                | (S::Connecting, S::Connected)
                | (S::Connecting | S::Connected, S::Error)
                | (S::Error, S::Reconnecting | S::Failed)
                | (S::Reconnecting, S::Failed)
                | (S::Connecting | S::Connected | S::Reconnecting, S::Disconnected)
        )
    }

    /// Validates a transition.
    pub fn transition_to(&self, target: ConnectionState) -> Result<ConnectionState> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(Error::InvalidTransition {
                from: self.to_string(),
                to: target.to_string(),
            })
        }
    }

    /// Returns true while a transport is open or being opened.
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }

    /// Compact encoding for atomic storage.
    pub fn to_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Reconnecting => 3,
            ConnectionState::Error => 4,
            ConnectionState::Failed => 5,
        }
    }

    pub fn from_u8(value: u8) -> Option<ConnectionState> {
        ConnectionState::ALL.get(usize::from(value)).copied()
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
