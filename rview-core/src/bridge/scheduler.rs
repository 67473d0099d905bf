//! Render scheduler: the two throttled render paths and move coalescing.
//!
//! ```text
//! full_render ──[≤ 1 / 100 ms]──► flush move ─► render ───────────► read ─► encode ─► host
//! quick_render ─[≤ 1 / 10 ms]───► flush move ─► render if moved ─► read ─► encode ─► host
//! ```
//!
//! Both paths drop calls that arrive too soon. Failures are recorded in
//! the scheduler's error slot and logged; they never propagate.

use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::bridge::diagnostics::Diagnostics;
use crate::bridge::encoder::{EncodedImage, FrameEncoder};
use crate::bridge::event::InteractionEvent;
use crate::bridge::renderer::{DisplayHost, InteractorEvent};
use crate::bridge::source::FrameSource;
use crate::bridge::throttle::RateLimiter;
use crate::clock::Clock;
use crate::error::BridgeError;

pub const DEFAULT_FULL_RENDER_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_QUICK_RENDER_INTERVAL: Duration = Duration::from_millis(10);

/// Result of a render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// A frame reached the host.
    Delivered,
    /// Dropped by the rate limiter.
    Throttled,
    /// The renderer or encoder failed; see [`RenderScheduler::last_error`].
    Failed,
}

impl RenderOutcome {
    pub fn is_delivered(self) -> bool {
        matches!(self, RenderOutcome::Delivered)
    }
}

// ── RenderScheduler ──────────────────────────────────────────────

pub struct RenderScheduler {
    source: FrameSource,
    encoder: FrameEncoder,
    host: Box<dyn DisplayHost>,
    full_limiter: RateLimiter,
    quick_limiter: RateLimiter,
    /// Latest pointer position not yet injected. Overwritten, never queued.
    pending_move: Option<InteractionEvent>,
    last_render: Option<Duration>,
    frames_delivered: u64,
    last_error: Option<String>,
}

impl RenderScheduler {
    pub fn new(
        source: FrameSource,
        encoder: FrameEncoder,
        host: Box<dyn DisplayHost>,
        full_interval: Duration,
        quick_interval: Duration,
    ) -> Self {
        Self {
            source,
            encoder,
            host,
            full_limiter: RateLimiter::new(full_interval),
            quick_limiter: RateLimiter::new(quick_interval),
            pending_move: None,
            last_render: None,
            frames_delivered: 0,
            last_error: None,
        }
    }

    pub fn source(&self) -> &FrameSource {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut FrameSource {
        &mut self.source
    }

    // ── Move coalescing ──────────────────────────────────────────

    /// Store `event` as the pending move, replacing any earlier one.
    pub fn buffer_move(&mut self, event: InteractionEvent) {
        self.pending_move = Some(event);
    }

    pub fn clear_pending_move(&mut self) {
        self.pending_move = None;
    }

    pub fn pending_move(&self) -> Option<&InteractionEvent> {
        self.pending_move.as_ref()
    }

    /// Inject the pending move, if any. Returns whether one was sent.
    pub fn flush_pending_move(&mut self) -> Result<bool, BridgeError> {
        match self.pending_move.take() {
            Some(ev) => {
                self.source.inject(&ev, &[InteractorEvent::MouseMove])?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Inject a discrete event immediately.
    pub fn inject(&self, event: &InteractionEvent, notifications: &[InteractorEvent]) -> Result<(), BridgeError> {
        self.source.inject(event, notifications)
    }

    // ── Render paths ─────────────────────────────────────────────

    /// Time since the last completed full/quick render, or `None` if
    /// neither path has run yet.
    pub fn since_last_render(&self, now: Duration) -> Option<Duration> {
        self.last_render.map(|t| now.saturating_sub(t))
    }

    /// Forced render outside the rate limiters, used when a session is
    /// opened. Returns how long it took.
    pub fn render_initial(&mut self, clock: &dyn Clock) -> Result<Duration, BridgeError> {
        let start = clock.now();
        self.deliver_frame(true)?;
        Ok(clock.now().saturating_sub(start))
    }

    /// Eager render for discrete actions (click, key, wheel, resize).
    pub fn full_render(&mut self, clock: &dyn Clock) -> RenderOutcome {
        let start = clock.now();
        if !self.full_limiter.try_acquire(start) {
            trace!("full render throttled");
            return RenderOutcome::Throttled;
        }

        let result = self.flush_pending_move().and_then(|_| self.deliver_frame(true));
        match result {
            Ok(()) => {
                let end = clock.now();
                self.last_render = Some(end);
                debug!(elapsed_s = end.saturating_sub(start).as_secs_f64(), "full render");
                RenderOutcome::Delivered
            }
            Err(e) => {
                self.record_error(&e);
                RenderOutcome::Failed
            }
        }
    }

    /// Cheap render for continuous motion. Injects the pending move and
    /// renders only if one was injected; otherwise the renderer's current
    /// frame is shipped as is.
    pub fn quick_render(&mut self, clock: &dyn Clock, diagnostics: &mut Diagnostics) -> RenderOutcome {
        let start = clock.now();
        if !self.quick_limiter.try_acquire(start) {
            trace!("quick render throttled");
            return RenderOutcome::Throttled;
        }

        let result = self.flush_pending_move().and_then(|moved| self.deliver_frame(moved));
        match result {
            Ok(()) => {
                let end = clock.now();
                if let Some(gap) = self.since_last_render(end) {
                    diagnostics.record_elapsed(gap.as_secs_f64());
                }
                self.last_render = Some(end);
                trace!(elapsed_s = end.saturating_sub(start).as_secs_f64(), "quick render");
                RenderOutcome::Delivered
            }
            Err(e) => {
                self.record_error(&e);
                RenderOutcome::Failed
            }
        }
    }

    fn deliver_frame(&mut self, force_render: bool) -> Result<(), BridgeError> {
        let pixels = self.source.get_frame(force_render)?;
        let (format, data) = self.encoder.encode(&pixels)?;

        self.frames_delivered += 1;
        self.host.deliver(EncodedImage {
            frame_number: self.frames_delivered,
            width: pixels.width,
            height: pixels.height,
            format,
            data: Bytes::from(data),
        });
        Ok(())
    }

    // ── Error slot ───────────────────────────────────────────────

    pub fn record_error(&mut self, error: &BridgeError) {
        warn!(%error, "render path error");
        self.last_error = Some(error.to_string());
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered
    }
}

// ── Tests ────────────────────────────────────────────────────────
