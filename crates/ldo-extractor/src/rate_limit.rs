//! Process-wide request rate limiting
//!
//! A token bucket of capacity R where every granted token returns to the
//! bucket exactly one window after it was taken. Equivalently: at most R
//! grants fall inside any rolling window.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Sliding-window limiter shared by every segment call of a run
#[derive(Debug)]
pub struct RateLimiter {
    capacity: usize,
    window: Duration,
    grants: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Allow `per_second` grants in any rolling second
    pub fn new(per_second: usize) -> Self {
        Self::with_window(per_second, Duration::from_secs(1))
    }

    /// Allow `capacity` grants in any rolling `window`
    pub fn with_window(capacity: usize, window: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            window,
            grants: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Maximum grants per window
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Wait until the caller may proceed.
    ///
    /// Cancel-safe: dropping the future while it sleeps takes no token.
    pub async fn acquire(&self) {
        loop {
            match self.try_take(Instant::now()) {
                Ok(()) => return,
                Err(wait) => {
                    trace!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Take a token if one is available right now
    pub fn try_acquire(&self) -> bool {
        self.try_take(Instant::now()).is_ok()
    }

    /// Tokens available right now
    pub fn available(&self) -> usize {
        let now = Instant::now();
        let mut grants = self.grants.lock().unwrap_or_else(PoisonError::into_inner);
        self.expire(&mut grants, now);
        self.capacity - grants.len()
    }

    fn try_take(&self, now: Instant) -> Result<(), Duration> {
        let mut grants = self.grants.lock().unwrap_or_else(PoisonError::into_inner);
        self.expire(&mut grants, now);

        if grants.len() < self.capacity {
            grants.push_back(now);
            return Ok(());
        }

        // Full: the oldest grant returns first
        let wait = grants
            .front()
            .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
            .unwrap_or(self.window);
        Err(wait.max(Duration::from_millis(1)))
    }

    fn expire(&self, grants: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = grants.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                grants.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_first_burst_is_immediate() {
        let limiter = RateLimiter::new(7);
        let start = Instant::now();
        for _ in 0..7 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.available(), 0);
        assert!(!limiter.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_eighth_grant_waits_a_window() {
        let limiter = RateLimiter::new(7);
        let start = Instant::now();
        for _ in 0..8 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() >= Duration::from_secs(1));
        assert!(start.elapsed() < Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_window_exceeds_capacity() {
        let limiter = Arc::new(RateLimiter::new(7));
        let mut handles = Vec::new();
        for _ in 0..30 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            }));
        }

        let mut grants = Vec::new();
        for handle in handles {
            grants.push(handle.await.unwrap());
        }
        grants.sort();

        // Any 8 consecutive grants span at least one second
        for pair in grants.windows(8) {
            assert!(pair[7].duration_since(pair[0]) >= Duration::from_secs(1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait_takes_no_token() {
        let limiter = RateLimiter::new(1);
        limiter.acquire().await;

        let cancelled = tokio::time::timeout(Duration::from_millis(100), limiter.acquire()).await;
        assert!(cancelled.is_err());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(limiter.available(), 1);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let limiter = RateLimiter::new(0);
        assert_eq!(limiter.capacity(), 1);
    }
}
