//! Client-side sliding-window rate limiting
//!
//! Admission control for logical operations (search, deployment,
//! transaction) independent of the chain: it refuses requests up front
//! rather than cancelling anything in flight. Pure in-memory state,
//! resets on process restart.
//!
//! The clock is injectable so tests can drive the window deterministically
//! and so multiple independent limiters can be instantiated explicitly
//! instead of sharing an ambient singleton.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Time source for the limiter.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Rate limiter configuration.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Maximum requests admitted per window.
    pub max_requests: usize,
    /// Window length.
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

/// Sliding-window request limiter keyed by operation label.
///
/// Check-and-record happens in a single synchronous body under one lock,
/// so concurrent callers never observe a half-updated window.
pub struct ClientRateLimiter<C: Clock = SystemClock> {
    config: RateLimitConfig,
    requests: Mutex<HashMap<String, Vec<Instant>>>,
    clock: C,
}

impl ClientRateLimiter<SystemClock> {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> ClientRateLimiter<C> {
    pub fn with_clock(config: RateLimitConfig, clock: C) -> Self {
        Self {
            config,
            requests: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Admit or reject a request for `key`.
    ///
    /// Purges timestamps older than the window, rejects at capacity,
    /// otherwise records the request and admits it.
    pub fn can_make_request(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut requests = self.requests.lock().expect("rate limiter lock poisoned");
        let timestamps = requests.entry(key.to_string()).or_default();

        timestamps.retain(|&t| now.duration_since(t) < self.config.window);

        if timestamps.len() >= self.config.max_requests {
            return false;
        }

        timestamps.push(now);
        true
    }

    /// Time until the oldest recorded request for `key` leaves the window,
    /// floored at zero. Zero when nothing is recorded.
    pub fn get_remaining_time(&self, key: &str) -> Duration {
        let now = self.clock.now();
        let requests = self.requests.lock().expect("rate limiter lock poisoned");

        let Some(oldest) = requests.get(key).and_then(|ts| ts.iter().min().copied()) else {
            return Duration::ZERO;
        };

        self.config
            .window
            .saturating_sub(now.duration_since(oldest))
    }
}
