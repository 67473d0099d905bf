//! Replay driver.
//!
//! An event log is JSON lines. Each line is one of:
//!
//! ```text
//! {"event":"mousedown","offsetX":10,"offsetY":20,"button":0,"timeStamp":1200.5}
//! {"touch":"start","touches":[[10,20]],"timeStamp":1300}
//! {"resize":[640,480]}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Records are fed to
//! a session in order, on a virtual clock that jumps to each record's
//! timestamp, or in real time with the original spacing.

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use rview_core::bridge::InteractionPhase;
use rview_core::{
    BridgeError, Clock, EventOutcome, ManualClock, RawDomEvent, RenderOutcome, Session, SystemClock,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ReplayConfig;
use crate::host::FrameDirectory;
use crate::renderer::{Camera, SyntheticRenderer};

/// Virtual time between consecutive records that carry no timestamp.
const UNTIMED_STEP: Duration = Duration::from_millis(16);

// ── Errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("report serialization failed: {0}")]
    Report(#[source] serde_json::Error),
}

// ── Records ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    Start,
    Move,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchRecord {
    pub touch: TouchPhase,
    #[serde(default)]
    pub touches: Vec<(f64, f64)>,
    #[serde(default)]
    pub time_stamp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeRecord {
    pub resize: (u32, u32),
    #[serde(default)]
    pub time_stamp: Option<f64>,
}

/// One line of an event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplayRecord {
    Dom(RawDomEvent),
    Touch(TouchRecord),
    Resize(ResizeRecord),
}

impl ReplayRecord {
    /// Source timestamp in milliseconds, if recorded.
    pub fn time_ms(&self) -> Option<f64> {
        match self {
            ReplayRecord::Dom(ev) => ev.time_stamp,
            ReplayRecord::Touch(t) => t.time_stamp,
            ReplayRecord::Resize(r) => r.time_stamp,
        }
    }
}

/// Parse a JSON-lines event log.
pub fn parse_records(text: &str) -> Result<Vec<ReplayRecord>, ReplayError> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line, text)| serde_json::from_str(text).map_err(|source| ReplayError::Parse { line, source }))
        .collect()
}

pub fn load_records(path: &Path) -> Result<Vec<ReplayRecord>, ReplayError> {
    parse_records(&std::fs::read_to_string(path)?)
}

// ── Report ───────────────────────────────────────────────────────

/// Summary of a finished replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Records fed to the session.
    pub records: usize,
    /// Records that reached the interactor or the pending-move slot.
    pub accepted: usize,
    /// Frames delivered by the session.
    pub frames: u64,
    /// Frames the host wrote to disk.
    pub frames_written: u64,
    pub last_error: Option<String>,
    pub final_delay: f64,
    pub elapsed_times: Vec<f64>,
    pub staleness_samples: usize,
    pub first_render_secs: Option<f64>,
    pub canvas: (u32, u32),
    pub camera: Camera,
    /// Whether the close callback fired.
    pub closed: bool,
}

impl ReplayReport {
    pub fn to_json(&self) -> Result<String, ReplayError> {
        serde_json::to_string_pretty(self).map_err(ReplayError::Report)
    }

    pub fn write(&self, path: &Path) -> Result<(), ReplayError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

// ── Replayer ─────────────────────────────────────────────────────

/// A session bound to a synthetic renderer and a frame directory.
pub struct Replayer {
    renderer: Rc<RefCell<SyntheticRenderer>>,
    session: Session,
    written: Rc<Cell<u64>>,
    closed: Rc<Cell<bool>>,
    records: usize,
    accepted: usize,
}

impl Replayer {
    pub fn open(config: &ReplayConfig, frames_dir: &Path, clock: Rc<dyn Clock>) -> Result<Self, ReplayError> {
        let renderer = Rc::new(RefCell::new(SyntheticRenderer::new(
            config.renderer.width,
            config.renderer.height,
        )));
        let host = FrameDirectory::create(frames_dir)?;
        let written = host.written();

        let closed = Rc::new(Cell::new(false));
        let flag = closed.clone();
        let session = Session::with_clock(&renderer, host, config.session.clone(), clock)?.with_on_close(move || {
            flag.set(true);
            debug!("replay session close callback");
        });
        info!(dir = %frames_dir.display(), "replay session opened");

        Ok(Self {
            renderer,
            session,
            written,
            closed,
            records: 0,
            accepted: 0,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Feed one record to the session.
    pub fn apply(&mut self, record: &ReplayRecord) -> EventOutcome {
        self.records += 1;
        let outcome = match record {
            ReplayRecord::Dom(ev) => self.session.handle_event(ev),
            ReplayRecord::Touch(t) => match t.touch {
                TouchPhase::Start => self.session.touch_start(&t.touches),
                TouchPhase::Move => self.session.touch_move(&t.touches),
                TouchPhase::End => self.session.touch_end(),
            },
            ReplayRecord::Resize(r) => {
                let (w, h) = r.resize;
                match self.session.resize(w, h) {
                    Ok(_) => EventOutcome::Injected,
                    Err(e) => {
                        warn!("resize to {w}x{h} rejected: {e}");
                        EventOutcome::Dropped
                    }
                }
            }
        };
        if outcome != EventOutcome::Dropped {
            self.accepted += 1;
        }
        outcome
    }

    /// Deliver a final full frame reflecting the end state.
    pub fn settle(&mut self) -> RenderOutcome {
        if self.session.phase() == InteractionPhase::Touching {
            self.session.touch_end();
        }
        self.session.full_render()
    }

    /// Close the session and summarise the run.
    pub fn finish(mut self) -> ReplayReport {
        self.session.close();
        let diagnostics = self.session.diagnostics();
        let report = ReplayReport {
            records: self.records,
            accepted: self.accepted,
            frames: self.session.frames_delivered(),
            frames_written: self.written.get(),
            last_error: self.session.last_error().map(str::to_owned),
            final_delay: self.session.quick_render_delay(),
            elapsed_times: diagnostics.elapsed_times().iter().copied().collect(),
            staleness_samples: diagnostics.staleness_samples().len(),
            first_render_secs: diagnostics.first_render().map(|d| d.as_secs_f64()),
            canvas: self.session.canvas_size(),
            camera: self.renderer.borrow().camera(),
            closed: self.closed.get(),
        };
        info!(frames = report.frames, records = report.records, "replay finished");
        report
    }
}

// ── Drivers ──────────────────────────────────────────────────────

/// Offset of `record` from the first timestamp. `None` when the record is
/// untimed or its offset is not representable as a `Duration`.
fn offset_from(first: Option<f64>, record: &ReplayRecord) -> Option<Duration> {
    let t = record.time_ms()?;
    let t0 = first.unwrap_or(t);
    match Duration::try_from_secs_f64(((t - t0) / 1000.0).max(0.0)) {
        Ok(offset) => Some(offset),
        Err(e) => {
            warn!(t_ms = t, "timestamp out of range, treating record as untimed: {e}");
            None
        }
    }
}

fn settle_gap(config: &ReplayConfig) -> Duration {
    Duration::from_millis(config.session.full_render_interval_ms)
}

/// Replay on a virtual clock. Runs as fast as the session can render.
pub fn replay(config: &ReplayConfig, frames_dir: &Path, records: &[ReplayRecord]) -> Result<ReplayReport, ReplayError> {
    let origin = Duration::from_secs(1);
    let clock = ManualClock::starting_at(origin);
    let mut replayer = Replayer::open(config, frames_dir, Rc::new(clock.clone()))?;
    let first = records.iter().find_map(ReplayRecord::time_ms);

    for record in records {
        match offset_from(first, record).and_then(|offset| origin.checked_add(offset)) {
            Some(at) => clock.set(at),
            None => clock.advance(UNTIMED_STEP),
        }
        let outcome = replayer.apply(record);
        debug!(?outcome, t_s = clock.now_secs(), "record");
    }

    clock.advance(settle_gap(config));
    replayer.settle();
    Ok(replayer.finish())
}

/// Replay on the system clock, reproducing the recorded spacing.
pub async fn replay_realtime(
    config: &ReplayConfig,
    frames_dir: &Path,
    records: &[ReplayRecord],
) -> Result<ReplayReport, ReplayError> {
    let mut replayer = Replayer::open(config, frames_dir, Rc::new(SystemClock::new()))?;
    let start = tokio::time::Instant::now();
    let first = records.iter().find_map(ReplayRecord::time_ms);

    for record in records {
        if let Some(deadline) = offset_from(first, record).and_then(|offset| start.checked_add(offset)) {
            tokio::time::sleep_until(deadline).await;
        }
        replayer.apply(record);
    }

    tokio::time::sleep(settle_gap(config)).await;
    replayer.settle();
    Ok(replayer.finish())
}

// ── Tests ────────────────────────────────────────────────────────
