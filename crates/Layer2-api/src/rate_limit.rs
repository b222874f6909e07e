//! Sliding-window admission gate
//!
//! Keeps the timestamps of admitted calls inside the trailing `period`. A call
//! is admitted while fewer than `calls` timestamps remain in the window; a
//! timestamp exactly `period` old no longer counts.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Per-service rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    calls: usize,
    period: Duration,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(calls: u32, period: Duration) -> Self {
        Self {
            calls: calls as usize,
            period,
            window: Mutex::new(VecDeque::with_capacity(calls as usize)),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls as u32
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Admit one call now if the window has room. Never blocks.
    pub fn acquire(&self) -> bool {
        let now = Instant::now();
        let mut window = self.window.lock();
        self.prune(&mut window, now);

        if window.len() < self.calls {
            window.push_back(now);
            true
        } else {
            false
        }
    }

    /// Calls that would be admitted right now
    pub fn remaining(&self) -> u32 {
        let now = Instant::now();
        let mut window = self.window.lock();
        self.prune(&mut window, now);
        self.calls.saturating_sub(window.len()) as u32
    }

    /// Time until the next call would be admitted; zero if one would be now
    pub fn retry_after(&self) -> Duration {
        if self.calls == 0 {
            return self.period;
        }

        let now = Instant::now();
        let mut window = self.window.lock();
        self.prune(&mut window, now);

        if window.len() < self.calls {
            return Duration::ZERO;
        }
        // the slot frees up when this timestamp leaves the window
        let freeing = window[window.len() - self.calls];
        self.period.saturating_sub(now.duration_since(freeing))
    }

    /// Wait for admission, but never longer than `max_wait`
    ///
    /// Returns `false` without sleeping when the next free slot lies beyond
    /// `max_wait`.
    pub async fn acquire_within(&self, max_wait: Duration) -> bool {
        let deadline = Instant::now() + max_wait;

        loop {
            if self.acquire() {
                return true;
            }

            let wait = self.retry_after().max(Duration::from_millis(1));
            if Instant::now() + wait > deadline {
                return false;
            }
            tokio::time::sleep(wait).await;
        }
    }

    fn prune(&self, window: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = window.front() {
            if now.duration_since(oldest) >= self.period {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_up_to_limit() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));

        assert!(limiter.acquire());
        assert!(limiter.acquire());
        assert!(!limiter.acquire());
        assert_eq!(limiter.remaining(), 0);
    }

    #[test]
    fn test_denial_has_no_side_effects() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.acquire());

        for _ in 0..10 {
            assert!(!limiter.acquire());
        }
        assert_eq!(limiter.window.lock().len(), 1);
    }

    #[test]
    fn test_window_slides() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50));

        assert!(limiter.acquire());
        assert!(!limiter.acquire());

        std::thread::sleep(Duration::from_millis(80));
        assert!(limiter.acquire());
    }

    #[test]
    fn test_call_exactly_one_period_old_is_dropped() {
        let period = Duration::from_secs(60);
        let limiter = RateLimiter::new(1, period);
        let now = Instant::now();

        let mut window = VecDeque::new();
        window.push_back(now);
        limiter.prune(&mut window, now + period);
        assert!(window.is_empty());

        window.push_back(now);
        limiter.prune(&mut window, now + period - Duration::from_nanos(1));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_retry_after() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert_eq!(limiter.retry_after(), Duration::ZERO);

        limiter.acquire();
        let wait = limiter.retry_after();
        assert!(wait > Duration::from_secs(59) && wait <= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_acquire_within_respects_bound() {
        let limiter = RateLimiter::new(1, Duration::from_millis(100));
        assert!(limiter.acquire());

        let started = Instant::now();
        assert!(!limiter.acquire_within(Duration::from_millis(10)).await);
        assert!(started.elapsed() < Duration::from_millis(50));

        assert!(limiter.acquire_within(Duration::from_millis(500)).await);
    }

    #[test]
    fn test_zero_calls_never_admits() {
        let limiter = RateLimiter::new(0, Duration::from_secs(1));
        assert!(!limiter.acquire());
        assert_eq!(limiter.retry_after(), Duration::from_secs(1));
    }
}
