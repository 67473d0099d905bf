//! Drop-if-too-soon rate limiting for the render entry points.
//!
//! Calls that arrive within `interval` of the last accepted call are
//! rejected outright; nothing is queued or deferred.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    last_accepted: Option<Duration>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_accepted: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Accept the call at `now` if the interval has elapsed since the last
    /// accepted one. Accepting records `now`.
    pub fn try_acquire(&mut self, now: Duration) -> bool {
        if let Some(last) = self.last_accepted {
            if now.saturating_sub(last) < self.interval {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }

    /// Forget the last accepted call.
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}
