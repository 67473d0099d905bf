//! Collaborator interfaces: the off-screen renderer, its interactor, and
//! the display host that receives encoded frames.
//!
//! None of these are implemented here. A session only ever talks to them
//! through these traits, and only from its own thread of control.

use crate::bridge::encoder::EncodedImage;
use crate::error::BridgeError;

// ── InteractorEvent ──────────────────────────────────────────────

/// Discrete notifications the interactor understands.
///
/// The event data (position, key symbol, modifiers) is set on the
/// interactor before the notification is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractorEvent {
    LeftButtonPress,
    LeftButtonRelease,
    MiddleButtonPress,
    MiddleButtonRelease,
    RightButtonPress,
    RightButtonRelease,
    MouseMove,
    Enter,
    Leave,
    KeyPress,
    Char,
    KeyRelease,
    MouseWheelForward,
    MouseWheelBackward,
}

impl InteractorEvent {
    /// Whether this is a button press or release.
    pub fn is_button(self) -> bool {
        matches!(
            self,
            Self::LeftButtonPress
                | Self::LeftButtonRelease
                | Self::MiddleButtonPress
                | Self::MiddleButtonRelease
                | Self::RightButtonPress
                | Self::RightButtonRelease
        )
    }
}

// ── Interactor ───────────────────────────────────────────────────

/// The renderer's input facade (camera / UI event injection).
pub trait Interactor {
    /// Position in renderer space (origin bottom-left).
    fn set_event_position(&mut self, x: i32, y: i32);
    fn set_key_sym(&mut self, sym: &str);
    fn set_key_code(&mut self, code: char);
    fn set_repeat_count(&mut self, count: u32);
    fn set_shift_key(&mut self, pressed: bool);
    fn set_control_key(&mut self, pressed: bool);
    fn set_alt_key(&mut self, pressed: bool);
    /// Fire a notification using the event data set so far.
    fn invoke(&mut self, event: InteractorEvent);
}

// ── Renderer ─────────────────────────────────────────────────────

/// An off-screen 3D rendering service.
pub trait Renderer {
    /// Current render window size in pixels.
    fn size(&self) -> (u32, u32);

    fn resize(&mut self, width: u32, height: u32);

    /// Render a fresh frame into the back buffer.
    fn render(&mut self) -> Result<(), BridgeError>;

    /// Read back the inclusive pixel rectangle `(x0, y0)..=(x1, y1)` as
    /// RGBA bytes, bottom row first.
    fn rgba_pixels(&mut self, x0: u32, y0: u32, x1: u32, y1: u32) -> Result<Vec<u8>, BridgeError>;

    fn interactor(&mut self) -> &mut dyn Interactor;

    /// Sessions always render off screen; renderers that care can switch
    /// their window mode here.
    fn set_offscreen_rendering(&mut self, _enabled: bool) {}
}

// ── DisplayHost ──────────────────────────────────────────────────

/// Receives encoded frames for display (canvas widget, file sink, ...).
pub trait DisplayHost {
    fn deliver(&mut self, image: EncodedImage);
}

impl<F> DisplayHost for F
where
    F: FnMut(EncodedImage),
{
    fn deliver(&mut self, image: EncodedImage) {
        self(image)
    }
}
