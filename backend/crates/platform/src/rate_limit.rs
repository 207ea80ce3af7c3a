//! Rate Limiting Infrastructure
//!
//! Sliding-window rate limiting: each key keeps the arrival times of its
//! recent requests, and admission depends on how many fall inside the
//! trailing window ending now.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Rate limit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
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

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// Rate limit check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Requests left in the current window after this one
    pub remaining: u32,
    /// First instant at which the oldest retained request has left the window
    pub reset_at_ms: i64,
}

impl RateLimitResult {
    /// Milliseconds until another request would be admitted
    pub fn retry_after_ms(&self, now_ms: i64) -> i64 {
        if self.allowed {
            0
        } else {
            (self.reset_at_ms - now_ms).max(0)
        }
    }
}

/// Error from a rate limit storage backend
#[derive(Debug, thiserror::Error)]
pub enum RateLimitStoreError {
    #[error("Rate limit store lock poisoned")]
    Poisoned,
    #[error("Rate limit store unavailable: {0}")]
    Unavailable(String),
}

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Evict expired timestamps, check the quota and record the request
    ///
    /// All three steps happen atomically per key: two concurrent calls
    /// never observe the same count.
    async fn check_and_record(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> Result<RateLimitResult, RateLimitStoreError>;

    /// Drop keys with no request inside the window. Returns how many were removed.
    async fn sweep(&self, window_ms: i64, now_ms: i64) -> Result<usize, RateLimitStoreError>;

    /// Number of keys currently tracked
    async fn tracked_keys(&self) -> Result<usize, RateLimitStoreError>;
}

/// In-process store: one ordered timestamp queue per key behind a single lock
///
/// Use a shared backend instead when several processes must share quotas.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    buckets: Mutex<HashMap<String, VecDeque<i64>>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Trim timestamps strictly older than `window_start` from the front
fn evict_before(bucket: &mut VecDeque<i64>, window_start: i64) {
    while bucket.front().is_some_and(|&ts| ts < window_start) {
        bucket.pop_front();
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    async fn check_and_record(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> Result<RateLimitResult, RateLimitStoreError> {
        let window_ms = config.window_ms();
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| RateLimitStoreError::Poisoned)?;

        let bucket = buckets.entry(key.to_owned()).or_default();
        evict_before(bucket, now_ms - window_ms);

        let count = u32::try_from(bucket.len()).unwrap_or(u32::MAX);
        if count >= config.max_requests {
            let oldest = bucket.front().copied().unwrap_or(now_ms);
            return Ok(RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_at_ms: oldest + window_ms + 1,
            });
        }

        bucket.push_back(now_ms);
        let oldest = bucket.front().copied().unwrap_or(now_ms);

        Ok(RateLimitResult {
            allowed: true,
            remaining: config.max_requests - count - 1,
            reset_at_ms: oldest + window_ms + 1,
        })
    }

    async fn sweep(&self, window_ms: i64, now_ms: i64) -> Result<usize, RateLimitStoreError> {
        let window_start = now_ms - window_ms;
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| RateLimitStoreError::Poisoned)?;

        let before = buckets.len();
        buckets.retain(|_, bucket| bucket.back().is_some_and(|&ts| ts >= window_start));
        Ok(before - buckets.len())
    }

    async fn tracked_keys(&self) -> Result<usize, RateLimitStoreError> {
        let buckets = self
            .buckets
            .lock()
            .map_err(|_| RateLimitStoreError::Poisoned)?;
        Ok(buckets.len())
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryRateLimitStore, RateLimitConfig, RateLimitStore};

    const WINDOW_MS: i64 = 60_000;

    fn config(max_requests: u32) -> RateLimitConfig {
        RateLimitConfig::new(max_requests, 60)
    }

    #[tokio::test]
    async fn test_admits_up_to_quota() {
        let store = InMemoryRateLimitStore::new();
        let config = config(3);

        for expected_remaining in [2, 1, 0] {
            let result = store.check_and_record("ip", &config, 1_000).await.unwrap();
            assert!(result.allowed);
            assert_eq!(result.remaining, expected_remaining);
        }

        let result = store.check_and_record("ip", &config, 1_000).await.unwrap();
        assert!(!result.allowed);
        assert_eq!(result.reset_at_ms, 1_000 + WINDOW_MS + 1);
    }

    #[tokio::test]
    async fn test_rejection_is_not_recorded() {
        let store = InMemoryRateLimitStore::new();
        let config = config(1);

        assert!(store.check_and_record("ip", &config, 0).await.unwrap().allowed);
        for t in [10, 20, 30] {
            assert!(!store.check_and_record("ip", &config, t).await.unwrap().allowed);
        }
        // Only the admitted request at t=0 counts, so the window reopens after it.
        assert!(store.check_and_record("ip", &config, WINDOW_MS + 1).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_sliding_window_boundary() {
        let store = InMemoryRateLimitStore::new();
        let config = config(2);

        store.check_and_record("ip", &config, 0).await.unwrap();
        store.check_and_record("ip", &config, 30_000).await.unwrap();

        // t=0 is exactly at window_start, so it is still retained.
        let result = store.check_and_record("ip", &config, WINDOW_MS).await.unwrap();
        assert!(!result.allowed);
        assert_eq!(result.retry_after_ms(WINDOW_MS), 1);

        // One millisecond later the first request has slid out.
        let result = store.check_and_record("ip", &config, WINDOW_MS + 1).await.unwrap();
        assert!(result.allowed);
        assert_eq!(result.remaining, 0);

        // The request at 30s is still inside, plus the one just admitted.
        let result = store.check_and_record("ip", &config, WINDOW_MS + 2).await.unwrap();
        assert!(!result.allowed);
        assert_eq!(result.reset_at_ms, 30_000 + WINDOW_MS + 1);
        assert_eq!(result.retry_after_ms(WINDOW_MS + 2), 30_000 - 1);
    }

    #[tokio::test]
    async fn test_admitted_at_reset_time() {
        let store = InMemoryRateLimitStore::new();
        let config = config(1);

        store.check_and_record("ip", &config, 500).await.unwrap();
        let rejected = store.check_and_record("ip", &config, 700).await.unwrap();
        assert!(!rejected.allowed);

        let early = store
            .check_and_record("ip", &config, rejected.reset_at_ms - 1)
            .await
            .unwrap();
        assert!(!early.allowed);
        assert_eq!(early.reset_at_ms, rejected.reset_at_ms);

        let on_time = store
            .check_and_record("ip", &config, rejected.reset_at_ms)
            .await
            .unwrap();
        assert!(on_time.allowed);
    }

    #[tokio::test]
    async fn test_no_boundary_burst() {
        let store = InMemoryRateLimitStore::new();
        let config = config(5);

        for _ in 0..5 {
            assert!(store.check_and_record("ip", &config, 59_000).await.unwrap().allowed);
        }
        // A fixed-window counter would reset at t=60s; the sliding window does not.
        assert!(!store.check_and_record("ip", &config, 61_000).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = InMemoryRateLimitStore::new();
        let config = config(1);

        assert!(store.check_and_record("a", &config, 0).await.unwrap().allowed);
        assert!(!store.check_and_record("a", &config, 1).await.unwrap().allowed);
        assert!(store.check_and_record("b", &config, 1).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_sweep_removes_idle_keys() {
        let store = InMemoryRateLimitStore::new();
        let config = config(10);

        store.check_and_record("idle", &config, 0).await.unwrap();
        store.check_and_record("active", &config, 0).await.unwrap();
        store.check_and_record("active", &config, 50_000).await.unwrap();
        assert_eq!(store.tracked_keys().await.unwrap(), 2);

        let removed = store.sweep(WINDOW_MS, 70_000).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.tracked_keys().await.unwrap(), 1);

        let removed = store.sweep(WINDOW_MS, 200_000).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.tracked_keys().await.unwrap(), 0);
    }

    #[test]
    fn test_config_window_ms() {
        assert_eq!(RateLimitConfig::new(10, 90).window_ms(), 90_000);
        assert_eq!(RateLimitConfig::default().max_requests, 100);
    }
}
