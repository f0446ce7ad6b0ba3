//! Rate limiter for WebSocket message handling.
//!
//! Keeps one client from flooding its room: every inbound frame counts
//! against a short burst window and a longer sustained window.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Rate limiter using a sliding window algorithm
#[derive(Debug)]
pub struct RateLimiter {
    /// Timestamps of recent requests
    timestamps: VecDeque<Instant>,
    /// Maximum number of requests allowed in the window
    max_requests: usize,
    /// Time window for rate limiting
    window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Example
    ///
    /// ```
    /// use room_server::api::rate_limiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// // Allow 10 requests per second
    /// let limiter = RateLimiter::new(10, Duration::from_secs(1));
    /// ```
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    /// Check if a request should be allowed
    ///
    /// Returns `true` if the request is allowed, `false` if rate limit exceeded.
    ///
    /// # Example
    ///
    /// ```
    /// # use room_server::api::rate_limiter::RateLimiter;
    /// # use std::time::Duration;
    /// let mut limiter = RateLimiter::new(5, Duration::from_secs(1));
    ///
    /// for _ in 0..5 {
    ///     assert!(limiter.check());
    /// }
    /// assert!(!limiter.check());
    /// ```
    pub fn check(&mut self) -> bool {
        let now = Instant::now();

        // Remove timestamps outside the window
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }

        if self.timestamps.len() >= self.max_requests {
            return false;
        }

        self.timestamps.push_back(now);
        true
    }

    /// Get the number of remaining requests allowed in the current window
    pub fn remaining(&self) -> usize {
        self.max_requests.saturating_sub(self.timestamps.len())
    }
}

/// Per-connection message allowances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLimits {
    /// Messages per second
    pub burst: usize,
    /// Messages per minute
    pub sustained: usize,
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self {
            burst: 10,
            sustained: 100,
        }
    }
}

/// Which window a rejected message ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttle {
    Burst,
    Sustained,
}

impl Throttle {
    /// Error text sent back to the client
    pub fn message(self) -> &'static str {
        match self {
            Throttle::Burst => "Rate limit exceeded. Please slow down.",
            Throttle::Sustained => "Too many messages. Please wait before sending more.",
        }
    }
}

/// Burst and sustained limiters for one connection.
#[derive(Debug)]
pub struct ConnectionLimiter {
    burst: RateLimiter,
    sustained: RateLimiter,
}

impl ConnectionLimiter {
    pub fn new(limits: MessageLimits) -> Self {
        Self {
            burst: RateLimiter::new(limits.burst, Duration::from_secs(1)),
            sustained: RateLimiter::new(limits.sustained, Duration::from_secs(60)),
        }
    }

    /// Count one inbound message, or say which limit it broke.
    pub fn check(&mut self) -> Result<(), Throttle> {
        if !self.burst.check() {
            return Err(Throttle::Burst);
        }
        if !self.sustained.check() {
            return Err(Throttle::Sustained);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_rate_limiter_blocks_over_limit() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(1));

        for _ in 0..3 {
            assert!(limiter.check());
        }
        assert!(!limiter.check(), "Should block request over limit");
    }

    #[test]
    fn test_rate_limiter_window_expiry() {
        let mut limiter = RateLimiter::new(2, Duration::from_millis(100));

        assert!(limiter.check());
        assert!(limiter.check());
        assert!(!limiter.check());

        thread::sleep(Duration::from_millis(150));

        assert!(limiter.check(), "Should allow after window expires");
        assert_eq!(limiter.remaining(), 1);
    }

    #[test]
    fn test_remaining_count() {
        let mut limiter = RateLimiter::new(5, Duration::from_secs(1));
        assert_eq!(limiter.remaining(), 5);

        limiter.check();
        limiter.check();
        assert_eq!(limiter.remaining(), 3);
    }

    #[test]
    fn test_connection_limiter_burst_first() {
        let mut limiter = ConnectionLimiter::new(MessageLimits::default());

        for _ in 0..10 {
            assert_eq!(limiter.check(), Ok(()));
        }
        assert_eq!(limiter.check(), Err(Throttle::Burst));
    }

    #[test]
    fn test_connection_limiter_sustained() {
        let mut limiter = ConnectionLimiter::new(MessageLimits {
            burst: 100,
            sustained: 3,
        });

        for _ in 0..3 {
            assert_eq!(limiter.check(), Ok(()));
        }
        assert_eq!(limiter.check(), Err(Throttle::Sustained));
    }
}
