//! Interaction state machine.
//!
//! Decides, per event, whether to inject it into the renderer right away,
//! buffer it as the pending move, or drop it, and drives the adaptive
//! quick-render delay from the staleness of processed moves.
//!
//! ```text
//!            pointerdown                 touch pointerdown
//!   Idle ────────────────► Dragging    Idle ─────────────────► Touching
//!    ▲                        │          ▲                         │
//!    └── pointerup / leave ───┘          └──── touch pointerup ────┘
//! ```
//!
//! While touching, only touch-tagged events are accepted.

use std::time::Duration;

use tracing::{debug, trace};

use crate::bridge::delay::{DelayAdjustment, RenderDelayController};
use crate::bridge::diagnostics::Diagnostics;
use crate::bridge::event::{EventKind, InteractionEvent};
use crate::bridge::renderer::InteractorEvent;
use crate::bridge::scheduler::RenderScheduler;
use crate::bridge::source::button_notification;
use crate::clock::Clock;
use crate::error::BridgeError;

// ── DragState ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragState {
    pub dragging: bool,
    /// Suppresses every non-touch event while set.
    pub touching: bool,
}

/// Coarse view of [`DragState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionPhase {
    Idle,
    Dragging,
    Touching,
}

impl DragState {
    pub fn phase(&self) -> InteractionPhase {
        if self.touching {
            InteractionPhase::Touching
        } else if self.dragging {
            InteractionPhase::Dragging
        } else {
            InteractionPhase::Idle
        }
    }
}

/// What happened to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Rejected without side effects.
    Dropped,
    /// Stored as the pending move.
    Buffered,
    /// Injected into the interactor.
    Injected,
}

/// Behaviour switches for the state machine.
#[derive(Debug, Clone, Copy)]
pub struct MachineOptions {
    pub allow_wheel: bool,
    /// Render on pointer motion even when no button is held.
    pub track_mouse_move: bool,
    pub adaptive_render_delay: bool,
    pub initial_delay_secs: f64,
}

// ── InteractionStateMachine ──────────────────────────────────────

#[derive(Debug, Clone)]
pub struct InteractionStateMachine {
    state: DragState,
    delay: RenderDelayController,
    /// `local - source` clock mapping, fixed at the first pointer move.
    clock_offset_secs: Option<f64>,
    options: MachineOptions,
}

impl InteractionStateMachine {
    pub fn new(options: MachineOptions) -> Self {
        Self {
            state: DragState::default(),
            delay: RenderDelayController::new(options.initial_delay_secs),
            clock_offset_secs: None,
            options,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn phase(&self) -> InteractionPhase {
        self.state.phase()
    }

    pub fn delay(&self) -> &RenderDelayController {
        &self.delay
    }

    pub fn delay_mut(&mut self) -> &mut RenderDelayController {
        &mut self.delay
    }

    pub fn set_track_mouse_move(&mut self, enabled: bool) {
        self.options.track_mouse_move = enabled;
    }

    pub fn options(&self) -> &MachineOptions {
        &self.options
    }

    /// Process one canonical event.
    pub fn handle(
        &mut self,
        event: &InteractionEvent,
        scheduler: &mut RenderScheduler,
        clock: &dyn Clock,
        diagnostics: &mut Diagnostics,
    ) -> Result<EventOutcome, BridgeError> {
        if event.is_touch && event.kind == EventKind::PointerDown {
            self.state.touching = true;
        }
        if self.state.touching && !event.is_touch {
            trace!(kind = ?event.kind, "dropped while touching");
            return Ok(EventOutcome::Dropped);
        }

        let outcome = self.dispatch(event, scheduler, clock, diagnostics);

        if event.is_touch && event.kind == EventKind::PointerUp {
            self.state.touching = false;
        }
        outcome
    }

    fn dispatch(
        &mut self,
        event: &InteractionEvent,
        scheduler: &mut RenderScheduler,
        clock: &dyn Clock,
        diagnostics: &mut Diagnostics,
    ) -> Result<EventOutcome, BridgeError> {
        match event.kind {
            EventKind::PointerMove => self.on_move(event, scheduler, clock, diagnostics),
            EventKind::PointerEnter => {
                scheduler.inject(event, &[InteractorEvent::Enter])?;
                scheduler.clear_pending_move();
                Ok(EventOutcome::Injected)
            }
            EventKind::PointerLeave => {
                scheduler.inject(event, &[InteractorEvent::Leave])?;
                scheduler.clear_pending_move();
                if self.state.dragging {
                    scheduler.inject(event, &[InteractorEvent::LeftButtonRelease])?;
                    self.state.dragging = false;
                }
                scheduler.full_render(clock);
                Ok(EventOutcome::Injected)
            }
            EventKind::PointerDown => {
                scheduler.flush_pending_move()?;
                self.state.dragging = true;
                let press: Vec<_> = button_notification(event).into_iter().collect();
                scheduler.inject(event, &press)?;
                scheduler.full_render(clock);
                Ok(EventOutcome::Injected)
            }
            EventKind::PointerUp => {
                scheduler.flush_pending_move()?;
                let release: Vec<_> = button_notification(event).into_iter().collect();
                scheduler.inject(event, &release)?;
                self.state.dragging = false;
                scheduler.full_render(clock);
                Ok(EventOutcome::Injected)
            }
            EventKind::KeyDown => {
                scheduler.flush_pending_move()?;
                scheduler.inject(event, &[InteractorEvent::KeyPress, InteractorEvent::Char])?;
                if !event.is_modifier_key() {
                    scheduler.full_render(clock);
                }
                Ok(EventOutcome::Injected)
            }
            EventKind::KeyUp => {
                scheduler.flush_pending_move()?;
                scheduler.inject(event, &[InteractorEvent::KeyRelease])?;
                if !event.is_modifier_key() {
                    scheduler.full_render(clock);
                }
                Ok(EventOutcome::Injected)
            }
            EventKind::Wheel => {
                if !self.options.allow_wheel {
                    return Ok(EventOutcome::Dropped);
                }
                scheduler.flush_pending_move()?;
                let notification = if event.wheel_delta < 0.0 {
                    InteractorEvent::MouseWheelForward
                } else {
                    InteractorEvent::MouseWheelBackward
                };
                scheduler.inject(event, &[notification])?;
                scheduler.full_render(clock);
                Ok(EventOutcome::Injected)
            }
        }
    }

    fn on_move(
        &mut self,
        event: &InteractionEvent,
        scheduler: &mut RenderScheduler,
        clock: &dyn Clock,
        diagnostics: &mut Diagnostics,
    ) -> Result<EventOutcome, BridgeError> {
        let now = clock.now_secs();
        // Untimed moves neither anchor the offset nor feed the delay.
        let source = event.timestamp_ms.map(|ms| {
            let secs = ms * 0.001;
            (secs, *self.clock_offset_secs.get_or_insert(now - secs))
        });

        scheduler.buffer_move(event.clone());
        if !self.state.dragging && !self.options.track_mouse_move {
            return Ok(EventOutcome::Buffered);
        }

        let adaptive = self.options.adaptive_render_delay && !self.state.touching;
        if let Some((source_secs, offset)) = source.filter(|_| adaptive) {
            let staleness = now - (source_secs + offset);
            let adjustment = self.delay.observe(staleness);
            if adjustment != DelayAdjustment::Unchanged {
                debug!(staleness_s = staleness, delay_s = self.delay.delay(), ?adjustment, "quick-render delay");
            }
            diagnostics.record_staleness(staleness, self.delay.delay());
        }

        let due = scheduler
            .since_last_render(clock.now())
            .is_none_or(|gap| gap > Duration::from_secs_f64(self.delay.delay()));
        if due {
            scheduler.quick_render(clock, diagnostics);
        }
        Ok(EventOutcome::Buffered)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::encoder::{EncodedImage, FrameEncoder};
    use crate::bridge::event::PointerButton;
    use crate::bridge::renderer::{Interactor, Renderer};
    use crate::bridge::scheduler::{DEFAULT_FULL_RENDER_INTERVAL, DEFAULT_QUICK_RENDER_INTERVAL};
    use crate::bridge::source::FrameSource;
    use crate::clock::ManualClock;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        fired: Vec<InteractorEvent>,
        renders: u32,
    }

    impl Interactor for Log {
        fn set_event_position(&mut self, _x: i32, _y: i32) {}
        fn set_key_sym(&mut self, _sym: &str) {}
        fn set_key_code(&mut self, _code: char) {}
        fn set_repeat_count(&mut self, _count: u32) {}
        fn set_shift_key(&mut self, _pressed: bool) {}
        fn set_control_key(&mut self, _pressed: bool) {}
        fn set_alt_key(&mut self, _pressed: bool) {}
        fn invoke(&mut self, event: InteractorEvent) {
            self.fired.push(event);
        }
    }

    impl Renderer for Log {
        fn size(&self) -> (u32, u32) {
            (4, 4)
        }
        fn resize(&mut self, _width: u32, _height: u32) {}
        fn render(&mut self) -> Result<(), BridgeError> {
            self.renders += 1;
            Ok(())
        }
        fn rgba_pixels(&mut self, _x0: u32, _y0: u32, _x1: u32, _y1: u32) -> Result<Vec<u8>, BridgeError> {
            Ok(vec![0; 64])
        }
        fn interactor(&mut self) -> &mut dyn Interactor {
            self
        }
    }

    struct Rig {
        renderer: Rc<RefCell<Log>>,
        scheduler: RenderScheduler,
        machine: InteractionStateMachine,
        clock: ManualClock,
        diag: Diagnostics,
        frames: Rc<RefCell<u32>>,
    }

    impl Rig {
        fn new(options: MachineOptions) -> Self {
            let renderer = Rc::new(RefCell::new(Log::default()));
            let frames = Rc::new(RefCell::new(0));
            let counter = frames.clone();
            let scheduler = RenderScheduler::new(
                FrameSource::new(&renderer, false).unwrap(),
                FrameEncoder::default(),
                Box::new(move |_img: EncodedImage| *counter.borrow_mut() += 1),
                DEFAULT_FULL_RENDER_INTERVAL,
                DEFAULT_QUICK_RENDER_INTERVAL,
            );
            Self {
                renderer,
                scheduler,
                machine: InteractionStateMachine::new(options),
                clock: ManualClock::starting_at(Duration::from_secs(10)),
                diag: Diagnostics::new(true),
                frames,
            }
        }

        fn feed(&mut self, ev: InteractionEvent) -> EventOutcome {
            self.machine
                .handle(&ev, &mut self.scheduler, &self.clock, &mut self.diag)
                .unwrap()
        }

        fn fired(&self) -> Vec<InteractorEvent> {
            self.renderer.borrow().fired.clone()
        }
    }

    fn options() -> MachineOptions {
        MachineOptions {
            allow_wheel: true,
            track_mouse_move: false,
            adaptive_render_delay: true,
            initial_delay_secs: 0.001,
        }
    }

    fn down() -> InteractionEvent {
        InteractionEvent::new(EventKind::PointerDown)
            .at(1, 1)
            .with_button(PointerButton::Left)
    }

    fn mv(x: i32, y: i32) -> InteractionEvent {
        InteractionEvent::new(EventKind::PointerMove).at(x, y)
    }

    #[test]
    fn hover_moves_never_render() {
        let mut rig = Rig::new(options());
        for i in 0..20 {
            rig.clock.advance(Duration::from_millis(50));
            assert_eq!(rig.feed(mv(i, i)), EventOutcome::Buffered);
        }
        assert_eq!(*rig.frames.borrow(), 0);
        assert!(rig.fired().is_empty());
        assert_eq!(rig.scheduler.pending_move().unwrap().position, Some((19, 19)));
    }

    #[test]
    fn track_mouse_move_renders_on_hover() {
        let mut rig = Rig::new(MachineOptions {
            track_mouse_move: true,
            ..options()
        });
        rig.feed(mv(2, 2));
        assert_eq!(*rig.frames.borrow(), 1);
        assert_eq!(rig.fired(), vec![InteractorEvent::MouseMove]);
    }

    #[test]
    fn press_enters_dragging_and_renders() {
        let mut rig = Rig::new(options());
        assert_eq!(rig.feed(down()), EventOutcome::Injected);
        assert_eq!(rig.machine.phase(), InteractionPhase::Dragging);
        assert_eq!(rig.fired(), vec![InteractorEvent::LeftButtonPress]);
        assert_eq!(rig.renderer.borrow().renders, 1);
    }

    #[test]
    fn press_flushes_pending_move_first() {
        let mut rig = Rig::new(options());
        rig.feed(mv(3, 3));
        rig.feed(down());
        assert_eq!(rig.fired(), vec![InteractorEvent::MouseMove, InteractorEvent::LeftButtonPress]);
    }

    #[test]
    fn drag_move_triggers_quick_render_when_due() {
        let mut rig = Rig::new(options());
        rig.feed(down());
        rig.clock.advance(Duration::from_millis(20));
        rig.feed(mv(2, 2));
        assert_eq!(*rig.frames.borrow(), 2);
        assert!(rig.scheduler.pending_move().is_none());
    }

    #[test]
    fn release_leaves_dragging() {
        let mut rig = Rig::new(options());
        rig.feed(down());
        let up = InteractionEvent::new(EventKind::PointerUp).at(1, 1).with_button(PointerButton::Left);
        rig.feed(up);
        assert_eq!(rig.machine.phase(), InteractionPhase::Idle);
        assert_eq!(
            rig.fired(),
            vec![InteractorEvent::LeftButtonPress, InteractorEvent::LeftButtonRelease]
        );
    }

    #[test]
    fn leave_while_dragging_releases() {
        let mut rig = Rig::new(options());
        rig.feed(down());
        rig.feed(mv(4, 4));
        rig.feed(InteractionEvent::new(EventKind::PointerLeave).at(9, 9));
        assert_eq!(rig.machine.phase(), InteractionPhase::Idle);
        assert!(rig.scheduler.pending_move().is_none());
        assert_eq!(
            rig.fired(),
            vec![
                InteractorEvent::LeftButtonPress,
                InteractorEvent::Leave,
                InteractorEvent::LeftButtonRelease,
            ]
        );
    }

    #[test]
    fn enter_clears_pending_move() {
        let mut rig = Rig::new(options());
        rig.feed(mv(4, 4));
        rig.feed(InteractionEvent::new(EventKind::PointerEnter).at(0, 0));
        assert!(rig.scheduler.pending_move().is_none());
        assert_eq!(rig.fired(), vec![InteractorEvent::Enter]);
        assert_eq!(rig.renderer.borrow().renders, 0);
    }

    #[test]
    fn modifier_keys_do_not_render() {
        let mut rig = Rig::new(options());
        for k in ["Shift", "Control", "Alt"] {
            rig.feed(InteractionEvent::new(EventKind::KeyDown).with_key(k));
            rig.clock.advance(Duration::from_secs(1));
            rig.feed(InteractionEvent::new(EventKind::KeyUp).with_key(k));
            rig.clock.advance(Duration::from_secs(1));
        }
        assert_eq!(rig.renderer.borrow().renders, 0);

        rig.feed(InteractionEvent::new(EventKind::KeyDown).with_key("r"));
        assert_eq!(rig.renderer.borrow().renders, 1);
        assert_eq!(
            &rig.fired()[rig.fired().len() - 2..],
            &[InteractorEvent::KeyPress, InteractorEvent::Char]
        );
    }

    #[test]
    fn wheel_direction_and_toggle() {
        let mut rig = Rig::new(options());
        rig.feed(InteractionEvent::new(EventKind::Wheel).at(1, 1).with_wheel_delta(-3.0));
        rig.feed(InteractionEvent::new(EventKind::Wheel).at(1, 1).with_wheel_delta(3.0));
        assert_eq!(
            rig.fired(),
            vec![InteractorEvent::MouseWheelForward, InteractorEvent::MouseWheelBackward]
        );

        let mut off = Rig::new(MachineOptions {
            allow_wheel: false,
            ..options()
        });
        let ev = InteractionEvent::new(EventKind::Wheel).with_wheel_delta(-1.0);
        assert_eq!(off.feed(ev), EventOutcome::Dropped);
        assert!(off.fired().is_empty());
    }

    #[test]
    fn touch_is_exclusive() {
        let mut rig = Rig::new(options());
        rig.feed(down().touch());
        assert_eq!(rig.machine.phase(), InteractionPhase::Touching);
        let before = rig.fired();

        assert_eq!(rig.feed(down()), EventOutcome::Dropped);
        assert_eq!(rig.fired(), before);

        let up = InteractionEvent::new(EventKind::PointerUp)
            .at(1, 1)
            .with_button(PointerButton::Left)
            .touch();
        rig.feed(up);
        assert_eq!(rig.machine.phase(), InteractionPhase::Idle);
        assert_eq!(rig.feed(down()), EventOutcome::Injected);
    }

    #[test]
    fn touch_moves_skip_adaptive_delay() {
        let mut rig = Rig::new(options());
        rig.feed(down().touch());
        rig.feed(mv(2, 2).with_timestamp(0.0).touch());
        rig.clock.advance(Duration::from_secs(1));
        rig.feed(mv(3, 3).with_timestamp(0.0).touch());
        assert!(rig.diag.staleness_samples().is_empty());
        assert_eq!(rig.machine.delay().delay(), 0.001);
    }

    #[test]
    fn clock_offset_is_fixed_at_first_move() {
        let mut rig = Rig::new(options());
        // First move establishes the offset even while hovering.
        rig.feed(mv(0, 0).with_timestamp(1000.0));
        rig.feed(down());

        // Source clock advanced 100 ms, local clock 400 ms: 300 ms stale.
        rig.clock.advance(Duration::from_millis(400));
        rig.feed(mv(1, 1).with_timestamp(1100.0));
        let s = rig.diag.staleness_samples()[0];
        assert!((s.staleness_secs - 0.3).abs() < 1e-9);
        assert!(rig.machine.delay().delay() > 0.001);
    }

    #[test]
    fn untimed_moves_leave_delay_alone() {
        let mut rig = Rig::new(options());
        rig.feed(down());
        for i in 0..600 {
            rig.clock.advance(Duration::from_millis(10));
            rig.feed(mv(i, i));
        }
        assert!(rig.diag.staleness_samples().is_empty());
        assert_eq!(rig.machine.delay().delay(), 0.001);
        // Every 10 ms move is past the quick-render spacing.
        assert_eq!(*rig.frames.borrow(), 601);

        // A later timed move anchors the offset itself.
        rig.clock.advance(Duration::from_millis(10));
        rig.feed(mv(0, 0).with_timestamp(50.0));
        let s = rig.diag.staleness_samples()[0];
        assert!(s.staleness_secs.abs() < 1e-9);
    }

    #[test]
    fn fresh_moves_shrink_delay() {
        let mut rig = Rig::new(MachineOptions {
            initial_delay_secs: 0.5,
            ..options()
        });
        rig.feed(down());
        for i in 0..10 {
            rig.clock.advance(Duration::from_millis(10));
            let t = 10_000.0 + f64::from(i) * 10.0;
            rig.feed(mv(i, i).with_timestamp(t));
        }
        assert!(rig.machine.delay().delay() < 0.5);
    }
}
