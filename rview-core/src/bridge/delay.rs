//! Adaptive quick-render delay.
//!
//! A bounded multiplicative feedback loop: when processed pointer moves
//! are older than 1.5× the current delay the consumer is falling behind
//! and the delay grows by [`ADJUST_FACTOR`]; when they are younger than
//! 0.5× the delay it shrinks by the same factor. The delay never leaves
//! [`MIN_DELAY_SECS`]..=[`MAX_DELAY_SECS`].

/// Lower bound of the quick-render delay, in seconds.
pub const MIN_DELAY_SECS: f64 = 0.001;
/// Upper bound of the quick-render delay, in seconds.
pub const MAX_DELAY_SECS: f64 = 2.0;
/// Multiplicative step per adjustment.
pub const ADJUST_FACTOR: f64 = 1.05;

const BEHIND_RATIO: f64 = 1.5;
const AHEAD_RATIO: f64 = 0.5;

/// Direction of the most recent adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayAdjustment {
    /// Falling behind: render less often.
    Increased,
    /// Headroom: render more often.
    Decreased,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderDelayController {
    delay_secs: f64,
}

impl RenderDelayController {
    pub fn new(initial_secs: f64) -> Self {
        let mut c = Self {
            delay_secs: MIN_DELAY_SECS,
        };
        c.set_delay(initial_secs);
        c
    }

    /// Current quick-render delay in seconds.
    pub fn delay(&self) -> f64 {
        self.delay_secs
    }

    /// Set the delay, clamped to the allowed range. NaN resets to the
    /// lower bound.
    pub fn set_delay(&mut self, secs: f64) {
        self.delay_secs = if secs.is_nan() {
            MIN_DELAY_SECS
        } else {
            secs.clamp(MIN_DELAY_SECS, MAX_DELAY_SECS)
        };
    }

    /// Feed one staleness sample (seconds) and adjust.
    pub fn observe(&mut self, staleness_secs: f64) -> DelayAdjustment {
        let current = self.delay_secs;
        if staleness_secs > BEHIND_RATIO * current {
            self.set_delay(current * ADJUST_FACTOR);
            DelayAdjustment::Increased
        } else if staleness_secs < AHEAD_RATIO * current {
            self.set_delay(current / ADJUST_FACTOR);
            DelayAdjustment::Decreased
        } else {
            DelayAdjustment::Unchanged
        }
    }
}

impl Default for RenderDelayController {
    fn default() -> Self {
        Self::new(MIN_DELAY_SECS)
    }
}
