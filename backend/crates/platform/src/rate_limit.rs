//! Rate Limiting Infrastructure
//!
//! Fixed-window counters keyed by client + endpoint category.
//! The store trait allows swapping the in-memory table for an external
//! store in multi-instance deployments.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Store errors are opaque to callers; they map to 500 upstream
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Authentication endpoints: 5 requests per 15 minutes
    pub fn login() -> Self {
        Self::new(5, 15 * 60)
    }

    /// General API traffic: 60 requests per minute
    pub fn general_api() -> Self {
        Self::new(60, 60)
    }

    /// Password reset: 3 requests per hour
    pub fn password_reset() -> Self {
        Self::new(3, 3600)
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// Rate limit check result
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
    /// Seconds until retry is sensible; 0 while allowed
    pub retry_after_secs: u64,
}

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Check and increment rate limit counter atomically
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, StoreError>;

    /// Drop the counter for a key (e.g., after successful authentication)
    async fn reset(&self, key: &str) -> Result<(), StoreError>;

    /// Remove counters whose window has elapsed; returns removed count
    async fn purge_expired(&self) -> Result<u64, StoreError>;
}

/// Current unix time in milliseconds
pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[derive(Debug)]
struct Counter {
    count: u32,
    reset_at_ms: i64,
}

/// In-memory rate limit store
///
/// A `Mutex<HashMap>` keeps each check-then-increment atomic per table;
/// suitable for tests and single-instance deployments.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    counters: Mutex<HashMap<String, Counter>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and increment using an explicit clock reading.
    ///
    /// The caller's single clock read is used for both the window check
    /// and the retry computation, so a concurrent purge can never observe
    /// a different expiry decision than the request itself.
    pub fn check_and_increment_at(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> RateLimitResult {
        let mut counters = self.counters.lock().expect("rate limit table poisoned");

        let counter = counters.get_mut(key);
        match counter {
            Some(c) if now_ms < c.reset_at_ms => {
                c.count += 1;
                if c.count > config.max_requests {
                    let retry_after_secs = ((c.reset_at_ms - now_ms).max(0) as u64).div_ceil(1000);
                    RateLimitResult {
                        allowed: false,
                        remaining: 0,
                        reset_at_ms: c.reset_at_ms,
                        retry_after_secs,
                    }
                } else {
                    RateLimitResult {
                        allowed: true,
                        remaining: config.max_requests - c.count,
                        reset_at_ms: c.reset_at_ms,
                        retry_after_secs: 0,
                    }
                }
            }
            _ => {
                // No counter, or the window elapsed: start a fresh window at 1
                let reset_at_ms = now_ms + config.window_ms();
                counters.insert(
                    key.to_string(),
                    Counter {
                        count: 1,
                        reset_at_ms,
                    },
                );
                RateLimitResult {
                    allowed: true,
                    remaining: config.max_requests.saturating_sub(1),
                    reset_at_ms,
                    retry_after_secs: 0,
                }
            }
        }
    }

    /// Purge using an explicit clock reading
    pub fn purge_expired_at(&self, now_ms: i64) -> u64 {
        let mut counters = self.counters.lock().expect("rate limit table poisoned");
        let before = counters.len();
        counters.retain(|_, c| now_ms < c.reset_at_ms);
        (before - counters.len()) as u64
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, StoreError> {
        Ok(self.check_and_increment_at(key, config, now_ms()))
    }

    async fn reset(&self, key: &str) -> Result<(), StoreError> {
        let mut counters = self.counters.lock().expect("rate limit table poisoned");
        counters.remove(key);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        Ok(self.purge_expired_at(now_ms()))
    }
}
