//! Raw browser input → canonical [`InteractionEvent`].
//!
//! Pointer/keyboard/wheel events arrive as [`RawDomEvent`]s and are
//! rescaled into canvas pixel space. Touch input arrives as lists of
//! touch locations and is synthesized into touch-tagged pointer events.

use std::time::Duration;

use crate::bridge::event::{EventKind, InteractionEvent, Modifiers, PointerButton, RawDomEvent};

/// Minimum wall time between two synthesized touch moves.
pub const DEFAULT_TOUCH_MOVE_INTERVAL: Duration = Duration::from_millis(10);

// ── EventNormalizer ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EventNormalizer {
    touch_move_interval: Duration,
    last_touch_move: Option<Duration>,
    /// Last synthesized touch location, reused for touch end.
    last_touch_position: Option<(i32, i32)>,
}

impl EventNormalizer {
    pub fn new(touch_move_interval: Duration) -> Self {
        Self {
            touch_move_interval,
            last_touch_move: None,
            last_touch_position: None,
        }
    }

    /// Normalize a DOM event against the current canvas size.
    ///
    /// Returns `None` for names the state machine does not act on.
    /// Rescaling only happens when the event carries a bounding-rect
    /// width; each axis with a positive bounding size is scaled by
    /// `canvas / bounding` and rounded.
    pub fn normalize(&self, raw: &RawDomEvent, canvas: (u32, u32)) -> Option<InteractionEvent> {
        let kind = EventKind::from_dom_name(&raw.event)?;

        let position = match (raw.offset_x, raw.offset_y) {
            (Some(x), Some(y)) => {
                let (x, y) = match raw.bounding_rect_width {
                    Some(bw) => (
                        rescale(x, canvas.0, Some(bw)),
                        rescale(y, canvas.1, raw.bounding_rect_height),
                    ),
                    None => (x, y),
                };
                Some((x.round() as i32, y.round() as i32))
            }
            _ => None,
        };

        let modifiers = if raw.shift_key.is_some() || raw.ctrl_key.is_some() || raw.alt_key.is_some() {
            let mut m = Modifiers::empty();
            m.set(Modifiers::SHIFT, raw.shift_key.unwrap_or(false));
            m.set(Modifiers::CONTROL, raw.ctrl_key.unwrap_or(false));
            m.set(Modifiers::ALT, raw.alt_key.unwrap_or(false));
            Some(m)
        } else {
            None
        };

        Some(InteractionEvent {
            kind,
            position,
            button: raw.button.and_then(PointerButton::from_dom),
            key: raw.key.clone(),
            modifiers,
            wheel_delta: raw.delta_y.unwrap_or(0.0),
            timestamp_ms: raw.time_stamp,
            is_touch: raw.is_touch,
        })
    }

    // ── Touch synthesis ──────────────────────────────────────────

    /// First finger down: a touch-tagged left press at the first location.
    pub fn touch_start(&mut self, touches: &[(f64, f64)], now: Duration) -> Option<InteractionEvent> {
        let &(x, y) = touches.first()?;
        let pos = (x.round() as i32, y.round() as i32);
        self.last_touch_position = Some(pos);
        Some(
            InteractionEvent::new(EventKind::PointerDown)
                .at(pos.0, pos.1)
                .with_button(PointerButton::Left)
                .with_timestamp(as_ms(now))
                .touch(),
        )
    }

    /// Finger moved. Rate limited to one event per touch-move interval.
    pub fn touch_move(&mut self, touches: &[(f64, f64)], now: Duration) -> Option<InteractionEvent> {
        let &(x, y) = touches.first()?;
        if let Some(last) = self.last_touch_move {
            if now.saturating_sub(last) < self.touch_move_interval {
                return None;
            }
        }
        self.last_touch_move = Some(now);

        let pos = (x.round() as i32, y.round() as i32);
        self.last_touch_position = Some(pos);
        Some(
            InteractionEvent::new(EventKind::PointerMove)
                .at(pos.0, pos.1)
                .with_timestamp(as_ms(now))
                .touch(),
        )
    }

    /// Last finger lifted: a touch-tagged left release at the last known
    /// touch location.
    pub fn touch_end(&mut self, now: Duration) -> InteractionEvent {
        let mut event = InteractionEvent::new(EventKind::PointerUp)
            .with_button(PointerButton::Left)
            .with_timestamp(as_ms(now))
            .touch();
        event.position = self.last_touch_position.take();
        event
    }
}

impl Default for EventNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_TOUCH_MOVE_INTERVAL)
    }
}

fn rescale(offset: f64, canvas: u32, bounding: Option<f64>) -> f64 {
    match bounding {
        Some(b) if b > 0.0 => offset * f64::from(canvas) / b,
        _ => offset,
    }
}

fn as_ms(t: Duration) -> f64 {
    t.as_secs_f64() * 1000.0
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescales_by_canvas_over_bounding_rect() {
        let n = EventNormalizer::default();
        let mut raw = RawDomEvent::named("mousemove").at(50.0, 30.0);
        raw.bounding_rect_width = Some(100.0);
        raw.bounding_rect_height = Some(60.0);
        let ev = n.normalize(&raw, (200, 120)).unwrap();
        assert_eq!(ev.position, Some((100, 60)));
    }

    #[test]
    fn no_bounding_width_means_no_rescale() {
        let n = EventNormalizer::default();
        let mut raw = RawDomEvent::named("mousemove").at(50.0, 30.0);
        // Height alone does not trigger rescaling.
        raw.bounding_rect_height = Some(60.0);
        let ev = n.normalize(&raw, (200, 120)).unwrap();
        assert_eq!(ev.position, Some((50, 30)));
    }

    #[test]
    fn zero_bounding_size_is_ignored() {
        let n = EventNormalizer::default();
        let mut raw = RawDomEvent::named("mousedown").at(7.0, 9.0);
        raw.bounding_rect_width = Some(0.0);
        raw.bounding_rect_height = Some(0.0);
        let ev = n.normalize(&raw, (640, 480)).unwrap();
        assert_eq!(ev.position, Some((7, 9)));
    }

    #[test]
    fn rounds_to_nearest_pixel() {
        let n = EventNormalizer::default();
        let mut raw = RawDomEvent::named("mousemove").at(10.0, 10.0);
        raw.bounding_rect_width = Some(3.0);
        raw.bounding_rect_height = Some(3.0);
        let ev = n.normalize(&raw, (4, 5)).unwrap();
        // 13.33 → 13, 16.67 → 17
        assert_eq!(ev.position, Some((13, 17)));
    }

    #[test]
    fn modifiers_only_when_reported() {
        let n = EventNormalizer::default();
        let mut raw = RawDomEvent::named("keydown");
        raw.key = Some("a".into());
        assert_eq!(n.normalize(&raw, (10, 10)).unwrap().modifiers, None);

        raw.shift_key = Some(true);
        raw.alt_key = Some(false);
        let m = n.normalize(&raw, (10, 10)).unwrap().modifiers.unwrap();
        assert_eq!(m, Modifiers::SHIFT);
    }

    #[test]
    fn inert_names_are_skipped() {
        let n = EventNormalizer::default();
        assert!(n.normalize(&RawDomEvent::named("contextmenu"), (10, 10)).is_none());
    }

    #[test]
    fn touch_start_and_end_synthesize_left_button() {
        let mut n = EventNormalizer::default();
        let down = n.touch_start(&[(10.4, 20.6)], Duration::from_millis(5)).unwrap();
        assert_eq!(down.kind, EventKind::PointerDown);
        assert_eq!(down.button, Some(PointerButton::Left));
        assert_eq!(down.position, Some((10, 21)));
        assert!(down.is_touch);

        let up = n.touch_end(Duration::from_millis(50));
        assert_eq!(up.kind, EventKind::PointerUp);
        assert_eq!(up.position, Some((10, 21)));
        assert!(up.is_touch);
    }

    #[test]
    fn touch_move_is_rate_limited() {
        let mut n = EventNormalizer::default();
        let t0 = Duration::from_millis(100);
        assert!(n.touch_move(&[(1.0, 1.0)], t0).is_some());
        assert!(n.touch_move(&[(2.0, 2.0)], t0 + Duration::from_millis(9)).is_none());
        let ev = n.touch_move(&[(3.0, 3.0)], t0 + Duration::from_millis(10)).unwrap();
        assert_eq!(ev.position, Some((3, 3)));
    }

    #[test]
    fn empty_touch_list_yields_nothing() {
        let mut n = EventNormalizer::default();
        assert!(n.touch_start(&[], Duration::ZERO).is_none());
        assert!(n.touch_move(&[], Duration::ZERO).is_none());
    }
}
