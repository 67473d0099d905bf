//! Session: binds one renderer to one display host.
//!
//! Owns the normalizer, state machine and scheduler, routes host events
//! through them, and ties teardown to a cleanup callback that fires
//! exactly once.
//!
//! # Lifetime
//!
//! A session is opened against a live renderer (it takes the renderer's
//! size as the canvas size and delivers a first frame). It holds only a
//! weak handle: dropping the renderer makes later accesses fail with
//! [`BridgeError::RendererUnavailable`], recorded in [`Session::last_error`].
//! [`close`](Session::close) is idempotent and also runs on drop.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bridge::diagnostics::{DEFAULT_DIAGNOSTICS_CAPACITY, Diagnostics};
use crate::bridge::encoder::{FrameEncoder, Quality};
use crate::bridge::event::{InteractionEvent, RawDomEvent};
use crate::bridge::machine::{EventOutcome, InteractionPhase, InteractionStateMachine, MachineOptions};
use crate::bridge::normalize::EventNormalizer;
use crate::bridge::renderer::{DisplayHost, Renderer};
use crate::bridge::scheduler::{RenderOutcome, RenderScheduler};
use crate::bridge::source::FrameSource;
use crate::clock::{Clock, SystemClock};
use crate::error::BridgeError;

/// DOM events the host should watch and forward. `wheel` is appended
/// when enabled.
const WATCHED_EVENTS: &[&str] = &[
    "dragstart",
    "mouseenter",
    "mouseleave",
    "mousedown",
    "mouseup",
    "mousemove",
    "keyup",
    "keydown",
    "contextmenu",
    "touch_move",
];

// ── SessionConfig ────────────────────────────────────────────────

/// Construction-time settings for a [`Session`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Compression quality, 0..=100.
    pub quality: i32,
    /// Keep the alpha channel (frames are delivered as PNG).
    pub transparent_background: bool,
    /// Forward wheel events to the renderer.
    pub allow_wheel: bool,
    /// Render on pointer motion even when no button is held.
    pub track_mouse_move: bool,
    /// Tune the quick-render delay from observed event staleness.
    pub adaptive_render_delay: bool,
    /// Record events and timing samples in [`Diagnostics`].
    pub log_events: bool,
    /// Entries kept per diagnostic series before the oldest are evicted.
    pub diagnostics_capacity: usize,
    /// Minimum spacing of full renders, in milliseconds.
    pub full_render_interval_ms: u64,
    /// Minimum spacing of quick renders, in milliseconds.
    pub quick_render_interval_ms: u64,
    /// Minimum spacing of synthesized touch moves, in milliseconds.
    pub touch_move_interval_ms: u64,
    /// Starting quick-render delay, in seconds.
    pub initial_quick_render_delay_secs: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            quality: 80,
            transparent_background: false,
            allow_wheel: true,
            track_mouse_move: false,
            adaptive_render_delay: true,
            log_events: true,
            diagnostics_capacity: DEFAULT_DIAGNOSTICS_CAPACITY,
            full_render_interval_ms: 100,
            quick_render_interval_ms: 10,
            touch_move_interval_ms: 10,
            initial_quick_render_delay_secs: 0.001,
        }
    }
}

impl SessionConfig {
    /// Check every field, failing on the first bad one.
    pub fn validate(&self) -> Result<Quality, BridgeError> {
        let quality = Quality::new(self.quality)?;
        if self.full_render_interval_ms == 0 || self.quick_render_interval_ms == 0 {
            return Err(BridgeError::config("render intervals must be at least 1 ms"));
        }
        if !self.initial_quick_render_delay_secs.is_finite() || self.initial_quick_render_delay_secs < 0.0 {
            return Err(BridgeError::config("initial quick-render delay must be a non-negative number"));
        }
        Ok(quality)
    }

    /// Event names the host should watch.
    pub fn watched_events(&self) -> Vec<&'static str> {
        let mut events = WATCHED_EVENTS.to_vec();
        if self.allow_wheel {
            events.push("wheel");
        }
        events
    }
}

// ── Session ──────────────────────────────────────────────────────

pub struct Session {
    config: SessionConfig,
    clock: Rc<dyn Clock>,
    normalizer: EventNormalizer,
    machine: InteractionStateMachine,
    scheduler: RenderScheduler,
    diagnostics: Diagnostics,
    on_close: Option<Box<dyn FnOnce()>>,
    closed: bool,
}

impl Session {
    /// Open a session on the system clock.
    pub fn new<R, H>(renderer: &Rc<RefCell<R>>, host: H, config: SessionConfig) -> Result<Self, BridgeError>
    where
        R: Renderer + 'static,
        H: DisplayHost + 'static,
    {
        Self::with_clock(renderer, host, config, Rc::new(SystemClock::new()))
    }

    /// Open a session on an explicit clock.
    pub fn with_clock<R, H>(
        renderer: &Rc<RefCell<R>>,
        host: H,
        config: SessionConfig,
        clock: Rc<dyn Clock>,
    ) -> Result<Self, BridgeError>
    where
        R: Renderer + 'static,
        H: DisplayHost + 'static,
    {
        let quality = config.validate()?;
        let source = FrameSource::new(renderer, config.transparent_background)?;
        let (width, height) = source.canvas_size();

        let scheduler = RenderScheduler::new(
            source,
            FrameEncoder::new(quality),
            Box::new(host),
            Duration::from_millis(config.full_render_interval_ms),
            Duration::from_millis(config.quick_render_interval_ms),
        );
        let machine = InteractionStateMachine::new(MachineOptions {
            allow_wheel: config.allow_wheel,
            track_mouse_move: config.track_mouse_move,
            adaptive_render_delay: config.adaptive_render_delay,
            initial_delay_secs: config.initial_quick_render_delay_secs,
        });

        let mut session = Self {
            normalizer: EventNormalizer::new(Duration::from_millis(config.touch_move_interval_ms)),
            diagnostics: Diagnostics::with_capacity(config.log_events, config.diagnostics_capacity),
            config,
            clock,
            machine,
            scheduler,
            on_close: None,
            closed: false,
        };

        match session.scheduler.render_initial(session.clock.as_ref()) {
            Ok(took) => {
                debug!(took_s = took.as_secs_f64(), "first image");
                session.diagnostics.set_first_render(took);
            }
            Err(e) => session.scheduler.record_error(&e),
        }
        info!(width, height, quality = quality.get(), "session opened");
        Ok(session)
    }

    /// Register the callback fired by [`close`](Self::close).
    pub fn with_on_close(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_close = Some(Box::new(callback));
        self
    }

    // ── Inbound events ───────────────────────────────────────────

    /// Handle a DOM event from the host. Errors are recorded, never
    /// returned.
    pub fn handle_event(&mut self, raw: &RawDomEvent) -> EventOutcome {
        if self.closed {
            return EventOutcome::Dropped;
        }
        match self.normalizer.normalize(raw, self.scheduler.source().canvas_size()) {
            Some(event) => self.dispatch(event),
            None => EventOutcome::Dropped,
        }
    }

    /// Parse and handle a JSON-encoded DOM event.
    pub fn handle_json(&mut self, text: &str) -> EventOutcome {
        match RawDomEvent::from_json(text) {
            Ok(raw) => self.handle_event(&raw),
            Err(e) => {
                self.scheduler.record_error(&e);
                EventOutcome::Dropped
            }
        }
    }

    pub fn touch_start(&mut self, touches: &[(f64, f64)]) -> EventOutcome {
        if self.closed {
            return EventOutcome::Dropped;
        }
        match self.normalizer.touch_start(touches, self.clock.now()) {
            Some(event) => self.dispatch(event),
            None => EventOutcome::Dropped,
        }
    }

    pub fn touch_move(&mut self, touches: &[(f64, f64)]) -> EventOutcome {
        if self.closed {
            return EventOutcome::Dropped;
        }
        match self.normalizer.touch_move(touches, self.clock.now()) {
            Some(event) => self.dispatch(event),
            None => EventOutcome::Dropped,
        }
    }

    pub fn touch_end(&mut self) -> EventOutcome {
        if self.closed {
            return EventOutcome::Dropped;
        }
        let event = self.normalizer.touch_end(self.clock.now());
        self.dispatch(event)
    }

    fn dispatch(&mut self, event: InteractionEvent) -> EventOutcome {
        self.diagnostics.record_event(&event);
        let result = self.machine.handle(
            &event,
            &mut self.scheduler,
            self.clock.as_ref(),
            &mut self.diagnostics,
        );
        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.scheduler.record_error(&e);
                EventOutcome::Dropped
            }
        }
    }

    // ── Render control ───────────────────────────────────────────

    /// Request a full render (rate limited).
    pub fn full_render(&mut self) -> RenderOutcome {
        if self.closed {
            return RenderOutcome::Failed;
        }
        self.scheduler.full_render(self.clock.as_ref())
    }

    /// Request a quick render (rate limited).
    pub fn quick_render(&mut self) -> RenderOutcome {
        if self.closed {
            return RenderOutcome::Failed;
        }
        self.scheduler.quick_render(self.clock.as_ref(), &mut self.diagnostics)
    }

    /// Resize the renderer and canvas, then request a full render.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<RenderOutcome, BridgeError> {
        if self.closed {
            return Err(BridgeError::SessionClosed);
        }
        self.scheduler.source_mut().resize(width, height)?;
        debug!(width, height, "canvas resized");
        Ok(self.scheduler.full_render(self.clock.as_ref()))
    }

    pub fn set_quick_render_delay(&mut self, secs: f64) {
        self.machine.delay_mut().set_delay(secs);
    }

    pub fn quick_render_delay(&self) -> f64 {
        self.machine.delay().delay()
    }

    pub fn set_track_mouse_move(&mut self, enabled: bool) {
        self.config.track_mouse_move = enabled;
        self.machine.set_track_mouse_move(enabled);
    }

    // ── Inspection ───────────────────────────────────────────────

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn watched_events(&self) -> Vec<&'static str> {
        self.config.watched_events()
    }

    pub fn phase(&self) -> InteractionPhase {
        self.machine.phase()
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        self.scheduler.source().canvas_size()
    }

    pub fn pending_move(&self) -> Option<&InteractionEvent> {
        self.scheduler.pending_move()
    }

    /// Message of the most recent swallowed error.
    pub fn last_error(&self) -> Option<&str> {
        self.scheduler.last_error()
    }

    pub fn clear_error(&mut self) {
        self.scheduler.clear_error();
    }

    pub fn frames_delivered(&self) -> u64 {
        self.scheduler.frames_delivered()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn is_renderer_available(&self) -> bool {
        self.scheduler.source().is_available()
    }

    // ── Teardown ─────────────────────────────────────────────────

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Stop accepting events and fire the cleanup callback. Later calls
    /// do nothing. Never touches the renderer.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.scheduler.clear_pending_move();
        if let Some(callback) = self.on_close.take() {
            callback();
        }
        if !self.is_renderer_available() {
            warn!("session closed after its renderer was dropped");
        }
        info!(frames = self.frames_delivered(), "session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Tests ────────────────────────────────────────────────────────
