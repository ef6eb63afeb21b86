//! Fixed-window rate limiting for telemetry ingestion.
//!
//! Ingestion can arrive at high frequency per trip; requests beyond the
//! window budget fail fast instead of queueing. Time is passed in by the
//! caller, keeping the accounting deterministic under test.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Raised when a key has exhausted its window budget.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("rate limit of {limit} per {window_secs}s exceeded, retry in {retry_after_secs}s")]
pub struct RateLimitExceeded {
    pub limit: u32,
    pub window_secs: u32,
    pub retry_after_secs: i64,
}

/// Per-key fixed-window counter.
///
/// Windows are aligned to wall-clock multiples of the width; a request in
/// a fresh window resets the key's count. Default budget is 100 per minute
/// per trip.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window_secs: u32,
    windows: HashMap<Uuid, (i64, u32)>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(100, 60)
    }
}

impl RateLimiter {
    pub fn new(limit: u32, window_secs: u32) -> Self {
        Self {
            limit,
            window_secs: window_secs.max(1),
            windows: HashMap::new(),
        }
    }

    /// Account one request against `key`, failing if the budget for the
    /// current window is spent.
    pub fn check(&mut self, key: Uuid, now: DateTime<Utc>) -> Result<(), RateLimitExceeded> {
        let width = i64::from(self.window_secs);
        let window_start = now.timestamp().div_euclid(width) * width;
        let entry = self.windows.entry(key).or_insert((window_start, 0));
        if entry.0 != window_start {
            *entry = (window_start, 0);
        }
        if entry.1 >= self.limit {
            return Err(RateLimitExceeded {
                limit: self.limit,
                window_secs: self.window_secs,
                retry_after_secs: window_start + width - now.timestamp(),
            });
        }
        entry.1 += 1;
        Ok(())
    }

    /// Drop accounting for windows older than the current one.
    ///
    /// Callers invoke this opportunistically; skipping it only costs
    /// memory, never correctness.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let width = i64::from(self.window_secs);
        let current = now.timestamp().div_euclid(width) * width;
        self.windows.retain(|_, (start, _)| *start == current);
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}
