// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Scoped distributed lock acquisition
//!
//! [`acquire_with_backoff`] retries a [`DistributedLock`] with a fixed delay
//! and returns a [`LockGuard`]. The guard is released explicitly on the happy
//! path; if it is dropped while still held (early return, cancelled future,
//! panic) the release is scheduled on the current Tokio runtime.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Acquire-with-backoff primitive used by the completion aggregator

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::coordination::{CoordinationError, DistributedLock, LockToken};
use crate::domain::node_config::LockConfig;

/// Bounded fixed-delay retry policy for lock acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub ttl: Duration,
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&LockConfig::default())
    }
}

impl From<&LockConfig> for RetryPolicy {
    fn from(config: &LockConfig) -> Self {
        Self {
            ttl: config.ttl(),
            max_attempts: config.max_attempts.max(1),
            delay: config.retry_delay(),
        }
    }
}

/// Held distributed lock. Released at most once.
pub struct LockGuard {
    lock: Arc<dyn DistributedLock>,
    key: String,
    token: Option<LockToken>,
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("key", &self.key)
            .field("held", &self.token.is_some())
            .finish()
    }
}

impl LockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Push the lock's expiry out to `ttl` from now. Fails with
    /// [`CoordinationError::LockLost`] once another holder could have taken it.
    pub async fn extend(&self, ttl: Duration) -> Result<(), CoordinationError> {
        let lost = || CoordinationError::LockLost {
            key: self.key.clone(),
        };
        let token = self.token.as_ref().ok_or_else(lost)?;
        if self.lock.extend(&self.key, token, ttl).await? {
            Ok(())
        } else {
            Err(lost())
        }
    }

    /// Release now and report whether this guard still owned the lock.
    pub async fn release(mut self) -> Result<bool, CoordinationError> {
        let Some(token) = self.token.take() else {
            return Ok(false);
        };
        self.lock.release(&self.key, &token).await
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };

        let lock = Arc::clone(&self.lock);
        let key = std::mem::take(&mut self.key);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = lock.release(&key, &token).await {
                        warn!(lock = %key, "Failed to release dropped lock guard: {}", e);
                    }
                });
            }
            Err(_) => {
                // Outside a runtime the TTL is the only way out.
                warn!(lock = %key, "Lock guard dropped outside a runtime, waiting for TTL expiry");
            }
        }
    }
}

/// Try to take `key` up to `policy.max_attempts` times, sleeping
/// `policy.delay` between attempts. Store errors abort immediately.
pub async fn acquire_with_backoff(
    lock: Arc<dyn DistributedLock>,
    key: &str,
    policy: &RetryPolicy,
) -> Result<LockGuard, CoordinationError> {
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        if let Some(token) = lock.try_acquire(key, policy.ttl).await? {
            return Ok(LockGuard {
                lock,
                key: key.to_string(),
                token: Some(token),
            });
        }

        metrics::counter!("taskfleet_lock_contention_total").increment(1);
        debug!(lock = %key, attempt, max_attempts = attempts, "Lock busy, backing off");

        if attempt < attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    Err(CoordinationError::LockNotObtained {
        key: key.to_string(),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::coordination::InMemoryCoordinationStore;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            ttl: Duration::from_secs(5),
            max_attempts,
            delay: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let store = Arc::new(InMemoryCoordinationStore::new());
        let guard = acquire_with_backoff(store.clone(), "lock-t1", &policy(1))
            .await
            .unwrap();
        assert_eq!(guard.key(), "lock-t1");
        assert!(store.is_locked("lock-t1"));

        assert!(guard.release().await.unwrap());
        assert!(!store.is_locked("lock-t1"));
    }

    #[tokio::test]
    async fn test_contention_exhausts_attempts() {
        let store = Arc::new(InMemoryCoordinationStore::new());
        let _held = acquire_with_backoff(store.clone(), "lock-t1", &policy(1))
            .await
            .unwrap();

        let err = acquire_with_backoff(store.clone(), "lock-t1", &policy(3))
            .await
            .unwrap_err();
        match err {
            CoordinationError::LockNotObtained { key, attempts } => {
                assert_eq!(key, "lock-t1");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_locks_are_independent_per_key() {
        let store = Arc::new(InMemoryCoordinationStore::new());
        let _a = acquire_with_backoff(store.clone(), "lock-a", &policy(1))
            .await
            .unwrap();
        let b = acquire_with_backoff(store.clone(), "lock-b", &policy(1)).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_waiter_obtains_lock_after_holder_releases() {
        let store = Arc::new(InMemoryCoordinationStore::new());
        let held = acquire_with_backoff(store.clone(), "lock-t1", &policy(1))
            .await
            .unwrap();

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move {
                acquire_with_backoff(store, "lock-t1", &policy(200)).await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        held.release().await.unwrap();

        let guard = waiter.await.unwrap().unwrap();
        assert!(guard.release().await.unwrap());
    }

    #[tokio::test]
    async fn test_extend_after_expiry_reports_lock_lost() {
        let store = Arc::new(InMemoryCoordinationStore::new());
        let short = RetryPolicy {
            ttl: Duration::from_millis(10),
            ..policy(1)
        };
        let guard = acquire_with_backoff(store.clone(), "lock-t1", &short).await.unwrap();
        guard.extend(Duration::from_secs(5)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.is_locked("lock-t1"));
        assert!(guard.release().await.unwrap());

        let guard = acquire_with_backoff(store.clone(), "lock-t1", &short).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let err = guard.extend(Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, CoordinationError::LockLost { key } if key == "lock-t1"));
    }

    #[tokio::test]
    async fn test_dropped_guard_releases_lock() {
        let store = Arc::new(InMemoryCoordinationStore::new());
        {
            let _guard = acquire_with_backoff(store.clone(), "lock-t1", &policy(1))
                .await
                .unwrap();
        }

        // Drop schedules the release on the runtime.
        let guard = acquire_with_backoff(store.clone(), "lock-t1", &policy(50)).await;
        assert!(guard.is_ok());
    }
}
