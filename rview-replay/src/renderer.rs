//! A synthetic renderer for replays.
//!
//! Paints a procedural scene whose look depends on a camera azimuth and
//! zoom. Left-button drags orbit, the wheel zooms, and `r` resets the
//! camera, so a replayed interaction log produces visibly different
//! frames. Like a real interactor style it redraws after every event it
//! reacts to.

use rview_core::{BridgeError, Interactor, InteractorEvent, Renderer};
use serde::{Deserialize, Serialize};
use tracing::trace;

const DEGREES_PER_PIXEL: f64 = 0.5;
const ZOOM_STEP: f64 = 1.1;
const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 10.0;

/// Camera state driven by the interactor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub azimuth: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { azimuth: 0.0, zoom: 1.0 }
    }
}

pub struct SyntheticRenderer {
    width: u32,
    height: u32,
    /// Bottom-up RGBA, `width * height * 4` bytes.
    pixels: Vec<u8>,
    camera: Camera,
    renders: u64,
    offscreen: bool,

    // Interactor state.
    position: (i32, i32),
    key_sym: String,
    shift: bool,
    orbiting: bool,
    last_drag: Option<(i32, i32)>,
}

impl SyntheticRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        let mut r = Self {
            width,
            height,
            pixels: Vec::new(),
            camera: Camera::default(),
            renders: 0,
            offscreen: false,
            position: (0, 0),
            key_sym: String::new(),
            shift: false,
            orbiting: false,
            last_drag: None,
        };
        r.paint();
        r
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Number of explicit `render()` calls.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub fn is_offscreen(&self) -> bool {
        self.offscreen
    }

    /// Redraw the scene into the pixel buffer.
    fn paint(&mut self) {
        let (w, h) = (self.width as usize, self.height as usize);
        self.pixels.clear();
        self.pixels.resize(w * h * 4, 0);

        let cx = w as f64 / 2.0;
        let cy = h as f64 / 2.0;
        let radius = cx.min(cy) * 0.8;
        let phase = self.camera.azimuth.to_radians();

        for y in 0..h {
            for x in 0..w {
                let dx = (x as f64 - cx) / self.camera.zoom;
                let dy = (y as f64 - cy) / self.camera.zoom;
                let angle = dy.atan2(dx) + phase;
                let inside = (dx * dx + dy * dy).sqrt() <= radius;

                let i = (y * w + x) * 4;
                self.pixels[i] = (127.5 * (1.0 + angle.cos())) as u8;
                self.pixels[i + 1] = (127.5 * (1.0 + angle.sin())) as u8;
                self.pixels[i + 2] = (255.0 * y as f64 / h.max(1) as f64) as u8;
                self.pixels[i + 3] = if inside { 255 } else { 0 };
            }
        }
    }

    fn orbit_to(&mut self, pos: (i32, i32)) {
        if let Some((lx, _)) = self.last_drag {
            let step = if self.shift { DEGREES_PER_PIXEL / 4.0 } else { DEGREES_PER_PIXEL };
            self.camera.azimuth = (self.camera.azimuth + f64::from(pos.0 - lx) * step).rem_euclid(360.0);
        }
        self.last_drag = Some(pos);
    }

    fn zoom_by(&mut self, factor: f64) {
        self.camera.zoom = (self.camera.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

impl Interactor for SyntheticRenderer {
    fn set_event_position(&mut self, x: i32, y: i32) {
        self.position = (x, y);
    }

    fn set_key_sym(&mut self, sym: &str) {
        self.key_sym.clear();
        self.key_sym.push_str(sym);
    }

    fn set_key_code(&mut self, _code: char) {}

    fn set_repeat_count(&mut self, _count: u32) {}

    fn set_shift_key(&mut self, pressed: bool) {
        self.shift = pressed;
    }

    fn set_control_key(&mut self, _pressed: bool) {}

    fn set_alt_key(&mut self, _pressed: bool) {}

    fn invoke(&mut self, event: InteractorEvent) {
        trace!(?event, position = ?self.position, "interactor");
        let changed = match event {
            InteractorEvent::LeftButtonPress => {
                self.orbiting = true;
                self.last_drag = Some(self.position);
                false
            }
            InteractorEvent::LeftButtonRelease => {
                self.orbiting = false;
                self.last_drag = None;
                false
            }
            InteractorEvent::MouseMove if self.orbiting => {
                self.orbit_to(self.position);
                true
            }
            InteractorEvent::MouseWheelForward => {
                self.zoom_by(ZOOM_STEP);
                true
            }
            InteractorEvent::MouseWheelBackward => {
                self.zoom_by(1.0 / ZOOM_STEP);
                true
            }
            InteractorEvent::Char if self.key_sym == "r" => {
                self.camera = Camera::default();
                true
            }
            _ => false,
        };
        if changed {
            self.paint();
        }
    }
}

impl Renderer for SyntheticRenderer {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.paint();
    }

    fn render(&mut self) -> Result<(), BridgeError> {
        self.renders += 1;
        self.paint();
        Ok(())
    }

    fn rgba_pixels(&mut self, x0: u32, y0: u32, x1: u32, y1: u32) -> Result<Vec<u8>, BridgeError> {
        if x1 < x0 || y1 < y0 || x1 >= self.width || y1 >= self.height {
            return Err(BridgeError::RenderFailure(format!(
                "readback ({x0},{y0})-({x1},{y1}) outside {}x{}",
                self.width, self.height
            )));
        }
        let row = self.width as usize * 4;
        let mut out = Vec::with_capacity(((x1 - x0 + 1) * (y1 - y0 + 1)) as usize * 4);
        for y in y0..=y1 {
            let start = y as usize * row + x0 as usize * 4;
            let end = y as usize * row + (x1 as usize + 1) * 4;
            out.extend_from_slice(&self.pixels[start..end]);
        }
        Ok(out)
    }

    fn interactor(&mut self) -> &mut dyn Interactor {
        self
    }

    fn set_offscreen_rendering(&mut self, enabled: bool) {
        self.offscreen = enabled;
    }
}

// ── Tests ────────────────────────────────────────────────────────
