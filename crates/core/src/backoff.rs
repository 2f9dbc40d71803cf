// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential reconnect backoff with additive jitter.
//!
//! `delay(attempt) = min(base * 2^attempt, max_delay) + uniform(0, jitter)`

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry timing for reconnect attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Delay before the first reconnect (milliseconds).
    pub base_ms: u64,
    /// Cap on the exponential part of the delay (milliseconds).
    pub max_delay_ms: u64,
    /// Upper bound of the random jitter added to every delay (milliseconds).
    pub jitter_ms: u64,
    /// Consecutive failed connection attempts before giving up.
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy {
            base_ms: 2_000,
            max_delay_ms: 32_000,
            jitter_ms: 1_000,
            max_attempts: 10,
        }
    }
}

impl BackoffPolicy {
    /// The capped exponential part of the delay, without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let ms = self.base_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    /// Delay for `attempt` with the given jitter, clamped to `jitter_ms`.
    pub fn delay_with_jitter(&self, attempt: u32, jitter_ms: u64) -> Duration {
        self.base_delay(attempt) + Duration::from_millis(jitter_ms.min(self.jitter_ms))
    }

    /// Delay for `attempt` with uniformly random jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        };
        self.delay_with_jitter(attempt, jitter)
    }

    /// Returns true if another attempt may follow `failures` consecutive failures.
    pub fn should_retry(&self, failures: u32) -> bool {
        failures < self.max_attempts
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
