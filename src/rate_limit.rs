//! Fixed-window in-process rate limiting.
//!
//! [`RateLimiter`] keeps one counter per `(action, client)` key in a
//! map behind a mutex. Counters are advisory: they are not durable, not
//! distributed, and tolerate races. Expired windows are evicted by a
//! periodic sweep task whose lifecycle is owned by the caller (abort the
//! returned handle to stop it).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Result of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Requests remaining in the current window.
    pub remaining: u32,
}

#[derive(Debug)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window counter keyed by an arbitrary string.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    window_len: Duration,
    max_requests: u32,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `window_len` per key.
    #[must_use]
    pub fn new(window_len: Duration, max_requests: u32) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            window_len,
            max_requests,
        }
    }

    /// Checks and counts one request for `key`.
    ///
    /// A fresh or expired window is reset to a count of one; an open
    /// window at the maximum rejects the request without blocking.
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        match windows.get_mut(key) {
            Some(window) if now <= window.reset_at => {
                if window.count >= self.max_requests {
                    return RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                    };
                }
                window.count += 1;
                RateLimitDecision {
                    allowed: true,
                    remaining: self.max_requests - window.count,
                }
            }
            _ => {
                windows.insert(
                    key.to_string(),
                    Window {
                        count: 1,
                        reset_at: now + self.window_len,
                    },
                );
                RateLimitDecision {
                    allowed: true,
                    remaining: self.max_requests.saturating_sub(1),
                }
            }
        }
    }

    /// Milliseconds until a fresh window opens. Used for retry hints.
    #[must_use]
    pub fn window_ms(&self) -> u64 {
        u64::try_from(self.window_len.as_millis()).unwrap_or(u64::MAX)
    }

    /// Evicts all expired windows.
    pub async fn sweep(&self) {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        windows.retain(|_, w| w.reset_at >= now);
    }

    /// Spawns the periodic sweep task. The returned handle owns the task
    /// lifecycle: abort it to stop sweeping.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                limiter.sweep().await;
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_max_then_rejects() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 3);

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check("register:1.2.3.4").await;
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let rejected = limiter.check("register:1.2.3.4").await;
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);

        assert!(limiter.check("redeem:a").await.allowed);
        assert!(!limiter.check("redeem:a").await.allowed);
        assert!(limiter.check("redeem:b").await.allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn window_expiry_resets_the_counter() {
        let limiter = RateLimiter::new(Duration::from_millis(100), 1);

        assert!(limiter.check("k").await.allowed);
        assert!(!limiter.check("k").await.allowed);

        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(limiter.check("k").await.allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_evicts_expired_windows() {
        let limiter = RateLimiter::new(Duration::from_millis(50), 5);
        let _ = limiter.check("stale").await;

        tokio::time::advance(Duration::from_millis(100)).await;
        limiter.sweep().await;

        let windows = limiter.windows.lock().await;
        assert!(windows.is_empty());
    }

    #[tokio::test]
    async fn sweeper_task_can_be_stopped() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(60), 5));
        let handle = limiter.spawn_sweeper(Duration::from_millis(10));
        handle.abort();
        let result = handle.await;
        assert!(matches!(result, Err(e) if e.is_cancelled()));
    }
}
