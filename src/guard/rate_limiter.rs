//! Rate limiting and throttling.
//!
//! Fixed-window counter per client key. A client may burst up to twice the
//! limit across a window boundary (end of one window, start of the next); that
//! is an accepted approximation of a sliding window, not a bug.
//!
//! Windows are measured on the wall clock so the check can be driven with
//! explicit timestamps. If the clock steps backwards past a window's start, the
//! start is pulled back to `now` and the count kept: the window then lasts at
//! most one more `window` length instead of however far the clock jumped.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::types::{ClientKey, Error, RateLimitConfig, Result};

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Request counted; `remaining` more fit in the current window.
    Allowed { remaining: u32 },
    /// Window exhausted. The request was not counted.
    Limited { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Shared admission control across all concurrent requests.
///
/// `check_and_increment` must be atomic per key: two racing calls for the same
/// client can never both observe `count = limit - 1` and both be admitted.
/// The in-memory implementation gets this from the map's entry lock; a
/// distributed implementation would use the store's atomic increment.
#[async_trait]
pub trait RateLimiter: Send + Sync + std::fmt::Debug {
    async fn check_and_increment(&self, key: &ClientKey) -> Result<RateDecision>;

    /// Requests allowed per window.
    fn limit(&self) -> u32;
}

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    window_start: DateTime<Utc>,
}

impl RateLimitEntry {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            window_start: now,
        }
    }
}

/// Process-wide in-memory limiter. Starts empty; entries are created on first
/// sight of a client and replaced when their window expires.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    limit: u32,
    window: Duration,
    entries: DashMap<String, RateLimitEntry>,
}

impl InMemoryRateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            entries: DashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Result<Self> {
        let window = Duration::from_std(config.window)
            .map_err(|e| Error::config(format!("rate_limit.window out of range: {}", e)))?;
        Ok(Self::new(config.limit, window))
    }

    /// Check and record a request at an explicit instant.
    pub fn check_at(&self, key: &ClientKey, now: DateTime<Utc>) -> RateDecision {
        match self.entries.entry(key.as_str().to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(RateLimitEntry::fresh(now));
                RateDecision::Allowed {
                    remaining: self.limit.saturating_sub(1),
                }
            }
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if entry.window_start > now {
                    entry.window_start = now;
                }
                if now - entry.window_start > self.window {
                    *entry = RateLimitEntry::fresh(now);
                    return RateDecision::Allowed {
                        remaining: self.limit.saturating_sub(1),
                    };
                }

                if entry.count >= self.limit {
                    let left = entry.window_start + self.window - now;
                    let retry_after_secs = ((left.num_milliseconds() + 999) / 1000).max(1) as u64;
                    return RateDecision::Limited { retry_after_secs };
                }

                entry.count += 1;
                RateDecision::Allowed {
                    remaining: self.limit - entry.count,
                }
            }
        }
    }

    /// Requests left for a client in its current window.
    pub fn remaining(&self, key: &ClientKey) -> u32 {
        self.remaining_at(key, Utc::now())
    }

    fn remaining_at(&self, key: &ClientKey, now: DateTime<Utc>) -> u32 {
        match self.entries.get(key.as_str()) {
            Some(entry) if now - entry.window_start <= self.window => {
                self.limit.saturating_sub(entry.count)
            }
            _ => self.limit,
        }
    }

    /// Drop entries whose window has already elapsed. Returns how many were removed.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = now - entry.window_start <= self.window;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Number of tracked client keys.
    pub fn tracked_clients(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check_and_increment(&self, key: &ClientKey) -> Result<RateDecision> {
        Ok(self.check_at(key, Utc::now()))
    }

    fn limit(&self) -> u32 {
        self.limit
    }
}

/// Periodically evict expired windows until `cancel` fires.
pub fn spawn_sweeper(
    limiter: Arc<InMemoryRateLimiter>,
    every: std::time::Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = limiter.evict_expired(Utc::now());
                    if removed > 0 {
                        tracing::debug!(
                            removed,
                            tracked = limiter.tracked_clients(),
                            "evicted expired rate-limit windows"
                        );
                    }
                }
            }
        }
    })
}
