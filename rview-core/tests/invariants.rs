//! Property tests for the numeric invariants of the bridge.

use std::time::Duration;

use proptest::prelude::*;
use rview_core::bridge::delay::{MAX_DELAY_SECS, MIN_DELAY_SECS};
use rview_core::bridge::{EventNormalizer, Quality, RateLimiter, RawDomEvent, RenderDelayController};

proptest! {
    #[test]
    fn quality_accepts_exactly_0_to_100(q in -1000i32..1000) {
        prop_assert_eq!(Quality::new(q).is_ok(), (0..=100).contains(&q));
    }

    #[test]
    fn delay_stays_clamped(
        initial in -10.0f64..10.0,
        staleness in prop::collection::vec(-5.0f64..50.0, 0..200),
    ) {
        let mut ctl = RenderDelayController::new(initial);
        prop_assert!(ctl.delay() >= MIN_DELAY_SECS && ctl.delay() <= MAX_DELAY_SECS);
        for s in staleness {
            ctl.observe(s);
            prop_assert!(ctl.delay() >= MIN_DELAY_SECS && ctl.delay() <= MAX_DELAY_SECS);
        }
    }

    #[test]
    fn rescaled_offsets_land_on_the_canvas(
        canvas_w in 1u32..4000,
        canvas_h in 1u32..4000,
        shown_w in 1.0f64..4000.0,
        shown_h in 1.0f64..4000.0,
        fx in 0.0f64..=1.0,
        fy in 0.0f64..=1.0,
    ) {
        let mut raw = RawDomEvent::named("mousemove").at(fx * shown_w, fy * shown_h);
        raw.bounding_rect_width = Some(shown_w);
        raw.bounding_rect_height = Some(shown_h);

        let ev = EventNormalizer::default()
            .normalize(&raw, (canvas_w, canvas_h))
            .unwrap();
        let (x, y) = ev.position.unwrap();
        prop_assert!((0..=canvas_w as i32).contains(&x));
        prop_assert!((0..=canvas_h as i32).contains(&y));
        prop_assert_eq!(x, (fx * shown_w * f64::from(canvas_w) / shown_w).round() as i32);
    }

    #[test]
    fn limiter_never_admits_two_calls_within_interval(
        interval_ms in 1u64..200,
        steps in prop::collection::vec(0u64..50, 1..300),
    ) {
        let interval = Duration::from_millis(interval_ms);
        let mut limiter = RateLimiter::new(interval);
        let mut now = Duration::ZERO;
        let mut last: Option<Duration> = None;
        for step in steps {
            now += Duration::from_millis(step);
            if limiter.try_acquire(now) {
                if let Some(prev) = last {
                    prop_assert!(now - prev >= interval);
                }
                last = Some(now);
            }
        }
    }
}
