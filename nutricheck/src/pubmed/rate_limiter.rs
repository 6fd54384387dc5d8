//! Request pacer shared by every clone of the PubMed client.
//!
//! A GCRA limiter with a burst of one: two requests are always at least
//! `interval` apart and idle time is never banked into a burst.

use governor::{DefaultDirectRateLimiter, Quota};
use nonzero_ext::nonzero;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct RateLimiter {
    limiter: DefaultDirectRateLimiter,
    /// Minimum spacing between two requests.
    interval: Duration,
    /// Name for logging
    name: String,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .finish()
    }
}

impl RateLimiter {
    /// Create a pacer that lets one request through per `interval`.
    /// A zero interval falls back to one second.
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        let (quota, interval) = match Quota::with_period(interval) {
            Some(quota) => (quota, interval),
            None => (Quota::per_second(nonzero!(1u32)), Duration::from_secs(1)),
        };

        Self {
            limiter: governor::RateLimiter::direct(quota.allow_burst(nonzero!(1u32))),
            interval,
            name: name.into(),
        }
    }

    /// Create a pacer allowing `requests_per_second` requests per second.
    /// Non-positive rates fall back to one request per second.
    pub fn from_rps(name: impl Into<String>, requests_per_second: f64) -> Self {
        let rps = if requests_per_second.is_finite() && requests_per_second > 0.0 {
            requests_per_second
        } else {
            1.0
        };
        Self::new(name, Duration::from_secs_f64(1.0 / rps))
    }

    /// Wait until the next request may be sent.
    pub async fn acquire(&self) {
        debug!(
            limiter = %self.name,
            interval_ms = self.interval.as_millis() as u64,
            "Waiting for request slot"
        );
        self.limiter.until_ready().await;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Shared rate limiter that can be cloned.
pub type SharedRateLimiter = Arc<RateLimiter>;

pub fn shared_limiter(name: impl Into<String>, requests_per_second: f64) -> SharedRateLimiter {
    Arc::new(RateLimiter::from_rps(name, requests_per_second))
}
