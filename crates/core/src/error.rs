// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for sluice-core operations.
//!
//! Every failure inside the subscription core is one of these variants.
//! Callers never see them as panics: the connection manager turns them into
//! an [`ErrorReport`] and hands that to the error handler.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// All possible errors that can occur in sluice operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("connection timed out after {0} ms waiting for the stream to open")]
    Timeout(u64),

    #[error("malformed frame: {0}")]
    Parse(String),

    #[error("event {id} belongs to channel '{got}', expected '{expected}'")]
    ChannelMismatch {
        id: String,
        expected: String,
        got: String,
    },

    #[error("gave up reconnecting after {attempts} attempts\n  hint: call reconnect() to try again")]
    MaxRetriesExceeded { attempts: u32 },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid state transition: cannot go from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("snapshot fetch failed: {0}")]
    SnapshotFetch(String),

    #[error("connection manager is no longer running")]
    ManagerStopped,

    #[error("configuration error: {0}")]
    Config(String),
}

/// A specialized Result type for sluice operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error classification exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Transport,
    Timeout,
    Parse,
    MaxRetriesExceeded,
    Storage,
    Snapshot,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Transport => "transport",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Parse => "parse",
            ErrorCode::MaxRetriesExceeded => "max_retries_exceeded",
            ErrorCode::Storage => "storage",
            ErrorCode::Snapshot => "snapshot",
            ErrorCode::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error object handed to the caller's error handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub message: String,
    pub code: ErrorCode,
    /// Milliseconds since Unix epoch when the error was observed.
    pub timestamp: u64,
    pub retryable: bool,
}

impl Error {
    /// Classifies the error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Transport(_) => ErrorCode::Transport,
            Error::Timeout(_) => ErrorCode::Timeout,
            Error::Parse(_) | Error::ChannelMismatch { .. } => ErrorCode::Parse,
            Error::MaxRetriesExceeded { .. } => ErrorCode::MaxRetriesExceeded,
            // Frames are decoded into `Parse`; JSON failures only come from stored values.
            Error::Storage(_) | Error::Sqlite(_) | Error::Json(_) => ErrorCode::Storage,
            Error::SnapshotFetch(_) => ErrorCode::Snapshot,
            Error::InvalidTransition { .. }
            | Error::ManagerStopped
            | Error::Config(_)
            | Error::Io(_) => ErrorCode::Internal,
        }
    }

    /// Returns true if the failure should trigger a backoff and retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout(_))
    }

    /// Builds the structured report for this error.
    pub fn report(&self, timestamp: u64) -> ErrorReport {
        ErrorReport {
            message: self.to_string(),
            code: self.code(),
            timestamp,
            retryable: self.is_retryable(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
