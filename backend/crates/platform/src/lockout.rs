//! Brute-Force Lockout Guard
//!
//! Temporary blocklist layered on top of windowed failure counting.
//! Per key the state machine is:
//! `Normal -> (max_attempts exceeded within window) -> Blocked(until) -> (now >= until) -> Normal`.
//!
//! This is independent of per-endpoint rate limiting: the rate limiter
//! throttles request volume, the guard reacts to *failed* authentications.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::rate_limit::{StoreError, now_ms};

/// Lockout configuration
#[derive(Debug, Clone)]
pub struct LockoutConfig {
    /// Failed attempts tolerated within the window before blocking
    pub max_attempts: u32,
    /// Window over which failures are counted
    pub attempt_window: Duration,
    /// How long a key stays blocked once the threshold is exceeded
    pub block_duration: Duration,
}

impl Default for LockoutConfig {
    /// 5 failures per 15 minutes, then a 15 minute block
    fn default() -> Self {
        Self {
            max_attempts: 5,
            attempt_window: Duration::from_secs(15 * 60),
            block_duration: Duration::from_secs(15 * 60),
        }
    }
}

impl LockoutConfig {
    pub fn new(max_attempts: u32, window_secs: u64, block_secs: u64) -> Self {
        Self {
            max_attempts,
            attempt_window: Duration::from_secs(window_secs),
            block_duration: Duration::from_secs(block_secs),
        }
    }

    fn window_ms(&self) -> i64 {
        self.attempt_window.as_millis() as i64
    }

    fn block_ms(&self) -> i64 {
        self.block_duration.as_millis() as i64
    }
}

/// Result of a lockout check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockoutStatus {
    /// Key is not blocked
    Clear,
    /// Key is blocked until the given time
    Blocked {
        block_until_ms: i64,
        retry_after_secs: u64,
    },
}

impl LockoutStatus {
    pub fn is_blocked(&self) -> bool {
        matches!(self, LockoutStatus::Blocked { .. })
    }

    pub fn retry_after_secs(&self) -> u64 {
        match self {
            LockoutStatus::Clear => 0,
            LockoutStatus::Blocked {
                retry_after_secs, ..
            } => *retry_after_secs,
        }
    }

    fn blocked(block_until_ms: i64, now_ms: i64) -> Self {
        LockoutStatus::Blocked {
            block_until_ms,
            retry_after_secs: ((block_until_ms - now_ms).max(0) as u64).div_ceil(1000),
        }
    }
}

/// Trait for lockout storage backends
#[trait_variant::make(LockoutStore: Send)]
pub trait LocalLockoutStore {
    /// Record a failed attempt; returns the key's status afterwards
    async fn record_failure(
        &self,
        key: &str,
        config: &LockoutConfig,
    ) -> Result<LockoutStatus, StoreError>;

    /// Check whether a key is currently blocked, lazily clearing
    /// expired block records
    async fn check_blocked(&self, key: &str) -> Result<LockoutStatus, StoreError>;

    /// Reset the failure counter after a successful authentication
    async fn clear_failures(&self, key: &str) -> Result<(), StoreError>;

    /// Remove expired failure counters and block records; returns removed count
    async fn purge_expired(&self) -> Result<u64, StoreError>;
}

#[derive(Debug)]
struct FailureWindow {
    count: u32,
    window_ends_ms: i64,
}

#[derive(Debug, Default)]
struct GuardState {
    failures: HashMap<String, FailureWindow>,
    blocks: HashMap<String, i64>,
}

/// In-memory lockout store
#[derive(Debug, Default)]
pub struct InMemoryLockoutStore {
    state: Mutex<GuardState>,
}

impl InMemoryLockoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure using an explicit clock reading
    pub fn record_failure_at(
        &self,
        key: &str,
        config: &LockoutConfig,
        now_ms: i64,
    ) -> LockoutStatus {
        let mut state = self.state.lock().expect("lockout table poisoned");

        // Already blocked: do not extend the block, just report it
        if let Some(&until) = state.blocks.get(key) {
            if now_ms < until {
                return LockoutStatus::blocked(until, now_ms);
            }
            state.blocks.remove(key);
        }

        let count = match state.failures.get_mut(key) {
            Some(w) if now_ms < w.window_ends_ms => {
                w.count += 1;
                w.count
            }
            _ => {
                state.failures.insert(
                    key.to_string(),
                    FailureWindow {
                        count: 1,
                        window_ends_ms: now_ms + config.window_ms(),
                    },
                );
                1
            }
        };

        if count > config.max_attempts {
            let until = now_ms + config.block_ms();
            state.blocks.insert(key.to_string(), until);
            state.failures.remove(key);
            LockoutStatus::blocked(until, now_ms)
        } else {
            LockoutStatus::Clear
        }
    }

    /// Check block state using an explicit clock reading
    pub fn check_blocked_at(&self, key: &str, now_ms: i64) -> LockoutStatus {
        let mut state = self.state.lock().expect("lockout table poisoned");
        match state.blocks.get(key) {
            Some(&until) if now_ms < until => LockoutStatus::blocked(until, now_ms),
            Some(_) => {
                // Expired block records are inert; drop lazily
                state.blocks.remove(key);
                LockoutStatus::Clear
            }
            None => LockoutStatus::Clear,
        }
    }

    /// Purge using an explicit clock reading
    pub fn purge_expired_at(&self, now_ms: i64) -> u64 {
        let mut state = self.state.lock().expect("lockout table poisoned");
        let before = state.failures.len() + state.blocks.len();
        state.failures.retain(|_, w| now_ms < w.window_ends_ms);
        state.blocks.retain(|_, &mut until| now_ms < until);
        (before - state.failures.len() - state.blocks.len()) as u64
    }
}

impl LockoutStore for InMemoryLockoutStore {
    async fn record_failure(
        &self,
        key: &str,
        config: &LockoutConfig,
    ) -> Result<LockoutStatus, StoreError> {
        Ok(self.record_failure_at(key, config, now_ms()))
    }

    async fn check_blocked(&self, key: &str) -> Result<LockoutStatus, StoreError> {
        Ok(self.check_blocked_at(key, now_ms()))
    }

    async fn clear_failures(&self, key: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("lockout table poisoned");
        state.failures.remove(key);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        Ok(self.purge_expired_at(now_ms()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LockoutConfig {
        LockoutConfig::new(3, 60, 300)
    }

    #[test]
    fn test_blocks_after_threshold() {
        let store = InMemoryLockoutStore::new();
        let t0 = 1_000_000;

        for _ in 0..3 {
            assert_eq!(store.record_failure_at("k", &config(), t0), LockoutStatus::Clear);
            assert_eq!(store.check_blocked_at("k", t0), LockoutStatus::Clear);
        }

        // Fourth failure exceeds max_attempts=3 and blocks for 300 s
        let status = store.record_failure_at("k", &config(), t0);
        assert!(status.is_blocked());
        assert_eq!(status.retry_after_secs(), 300);
        assert!(store.check_blocked_at("k", t0).is_blocked());
    }

    #[test]
    fn test_block_expires() {
        let store = InMemoryLockoutStore::new();
        let t0 = 0;

        for _ in 0..4 {
            store.record_failure_at("k", &config(), t0);
        }
        assert!(store.check_blocked_at("k", t0 + 299_999).is_blocked());
        assert_eq!(store.check_blocked_at("k", t0 + 300_000), LockoutStatus::Clear);

        // Counter started over after the block: one failure does not re-block
        assert_eq!(
            store.record_failure_at("k", &config(), t0 + 300_000),
            LockoutStatus::Clear
        );
    }

    #[test]
    fn test_window_expiry_resets_count() {
        let store = InMemoryLockoutStore::new();
        let t0 = 0;

        for _ in 0..3 {
            store.record_failure_at("k", &config(), t0);
        }
        // The window ended; this failure starts a new count at 1
        assert_eq!(
            store.record_failure_at("k", &config(), t0 + 60_000),
            LockoutStatus::Clear
        );
    }

    #[tokio::test]
    async fn test_clear_failures_on_success() {
        let store = InMemoryLockoutStore::new();
        let cfg = config();

        // UFCS: the Send variant and its local counterpart are both in
        // scope, so plain method syntax is ambiguous
        for _ in 0..3 {
            LockoutStore::record_failure(&store, "k", &cfg).await.unwrap();
        }
        LockoutStore::clear_failures(&store, "k").await.unwrap();

        // Counter was reset; the next failure is the first of a new window
        let status = LockoutStore::record_failure(&store, "k", &cfg).await.unwrap();
        assert_eq!(status, LockoutStatus::Clear);
    }

    #[test]
    fn test_purge_expired() {
        let store = InMemoryLockoutStore::new();
        let cfg = config();

        store.record_failure_at("counting", &cfg, 0);
        for _ in 0..4 {
            store.record_failure_at("blocked", &cfg, 0);
        }

        // Failure window ends at 60 s, block at 300 s
        assert_eq!(store.purge_expired_at(60_000), 1);
        assert_eq!(store.purge_expired_at(300_000), 1);
        assert_eq!(store.purge_expired_at(400_000), 0);
    }
}
