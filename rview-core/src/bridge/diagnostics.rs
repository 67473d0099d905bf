//! Per-session diagnostic recorder.
//!
//! Captures the normalized event stream, the time between consecutive
//! quick renders, and staleness samples for tuning the adaptive delay.
//! Recording is a no-op unless enabled. Each series is a rolling window
//! of at most `capacity` entries; the oldest entries are evicted first.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

use crate::bridge::event::InteractionEvent;

/// Default per-series window size.
pub const DEFAULT_DIAGNOSTICS_CAPACITY: usize = 10_000;

/// One adaptive-delay observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StalenessSample {
    /// Age of the processed pointer move, in seconds.
    pub staleness_secs: f64,
    /// Quick-render delay after the adjustment, in seconds.
    pub delay_secs: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    enabled: bool,
    capacity: usize,
    events: VecDeque<InteractionEvent>,
    elapsed_times: VecDeque<f64>,
    staleness_samples: VecDeque<StalenessSample>,
    /// Entries dropped from any series to stay within `capacity`.
    evicted: u64,
    first_render: Option<Duration>,
}

impl Diagnostics {
    pub fn new(enabled: bool) -> Self {
        Self::with_capacity(enabled, DEFAULT_DIAGNOSTICS_CAPACITY)
    }

    /// Recorder keeping at most `capacity` entries per series.
    pub fn with_capacity(enabled: bool, capacity: usize) -> Self {
        Self {
            enabled,
            capacity,
            events: VecDeque::new(),
            elapsed_times: VecDeque::new(),
            staleness_samples: VecDeque::new(),
            evicted: 0,
            first_render: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record_event(&mut self, event: &InteractionEvent) {
        if self.enabled {
            self.evicted += push_bounded(&mut self.events, event.clone(), self.capacity);
        }
    }

    pub fn record_elapsed(&mut self, secs: f64) {
        if self.enabled {
            self.evicted += push_bounded(&mut self.elapsed_times, secs, self.capacity);
        }
    }

    pub fn record_staleness(&mut self, staleness_secs: f64, delay_secs: f64) {
        if self.enabled {
            let sample = StalenessSample {
                staleness_secs,
                delay_secs,
            };
            self.evicted += push_bounded(&mut self.staleness_samples, sample, self.capacity);
        }
    }

    /// Duration of the construction-time render. Always kept.
    pub fn set_first_render(&mut self, took: Duration) {
        self.first_render = Some(took);
    }

    pub fn events(&self) -> &VecDeque<InteractionEvent> {
        &self.events
    }

    /// Seconds between consecutive quick renders, oldest first.
    pub fn elapsed_times(&self) -> &VecDeque<f64> {
        &self.elapsed_times
    }

    pub fn staleness_samples(&self) -> &VecDeque<StalenessSample> {
        &self.staleness_samples
    }

    /// Total entries evicted since creation or the last [`clear`](Self::clear).
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn first_render(&self) -> Option<Duration> {
        self.first_render
    }

    /// Drop everything recorded so far (the enabled flag is kept).
    pub fn clear(&mut self) {
        self.events.clear();
        self.elapsed_times.clear();
        self.staleness_samples.clear();
        self.evicted = 0;
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Append `value`, evicting from the front to stay within `capacity`.
/// Returns how many entries were evicted.
fn push_bounded<T>(series: &mut VecDeque<T>, value: T, capacity: usize) -> u64 {
    if capacity == 0 {
        return 1;
    }
    let mut evicted = 0;
    while series.len() >= capacity {
        series.pop_front();
        evicted += 1;
    }
    series.push_back(value);
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::event::EventKind;

    #[test]
    fn disabled_recorder_keeps_nothing() {
        let mut d = Diagnostics::new(false);
        d.record_event(&InteractionEvent::new(EventKind::KeyDown));
        d.record_elapsed(0.1);
        d.record_staleness(0.1, 0.2);
        assert!(d.events().is_empty());
        assert!(d.elapsed_times().is_empty());
        assert!(d.staleness_samples().is_empty());
    }

    #[test]
    fn enabled_recorder_and_clear() {
        let mut d = Diagnostics::new(true);
        d.record_event(&InteractionEvent::new(EventKind::KeyDown));
        d.record_staleness(0.1, 0.2);
        d.set_first_render(Duration::from_millis(3));
        assert_eq!(d.events().len(), 1);
        assert_eq!(d.staleness_samples()[0].delay_secs, 0.2);

        d.clear();
        assert!(d.events().is_empty());
        assert!(d.is_enabled());
        assert_eq!(d.first_render(), Some(Duration::from_millis(3)));
    }

    #[test]
    fn series_are_rolling_windows() {
        let mut d = Diagnostics::with_capacity(true, 3);
        for i in 0..10 {
            d.record_elapsed(f64::from(i));
            d.record_staleness(f64::from(i), 0.001);
        }
        assert_eq!(d.elapsed_times().iter().copied().collect::<Vec<_>>(), vec![7.0, 8.0, 9.0]);
        assert_eq!(d.staleness_samples().len(), 3);
        assert_eq!(d.staleness_samples()[0].staleness_secs, 7.0);
        assert_eq!(d.evicted(), 14);

        d.clear();
        assert_eq!(d.evicted(), 0);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut d = Diagnostics::with_capacity(true, 0);
        d.record_event(&InteractionEvent::new(EventKind::KeyUp));
        assert!(d.events().is_empty());
        assert_eq!(d.evicted(), 1);
    }
}
