//! Interaction event types.
//!
//! [`RawDomEvent`] mirrors the JSON the browser-side event watcher sends
//! (DOM field names, everything optional except the event name).
//! [`InteractionEvent`] is the canonical shape fed to the state machine:
//! offsets are already in canvas pixel space.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

// ── RawDomEvent ──────────────────────────────────────────────────

/// A browser event as received from the host.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDomEvent {
    /// DOM event name, e.g. `"mousedown"` or `"pointerdown"`.
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_key: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctrl_key: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_key: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_y: Option<f64>,
    /// Origin timestamp in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_stamp: Option<f64>,
    /// Displayed size of the canvas element, when the watcher reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_rect_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_rect_height: Option<f64>,
    #[serde(default, alias = "touch_event")]
    pub is_touch: bool,
}

impl RawDomEvent {
    /// Parse a single JSON object.
    pub fn from_json(text: &str) -> Result<Self, BridgeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Minimal event with just a name; handy for building fixtures.
    pub fn named(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            ..Self::default()
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.offset_x = Some(x);
        self.offset_y = Some(y);
        self
    }

    pub fn with_time(mut self, ms: f64) -> Self {
        self.time_stamp = Some(ms);
        self
    }
}

// ── EventKind ────────────────────────────────────────────────────

/// The interaction kinds the state machine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    PointerDown,
    PointerUp,
    PointerMove,
    PointerEnter,
    PointerLeave,
    KeyDown,
    KeyUp,
    Wheel,
}

impl EventKind {
    /// Map a DOM event name. Both the `mouse*` and `pointer*` spellings
    /// are accepted. Watched-but-inert names (`dragstart`, `contextmenu`)
    /// and unknown names map to `None`.
    pub fn from_dom_name(name: &str) -> Option<Self> {
        let kind = match name {
            "mousedown" | "pointerdown" => EventKind::PointerDown,
            "mouseup" | "pointerup" => EventKind::PointerUp,
            "mousemove" | "pointermove" => EventKind::PointerMove,
            "mouseenter" | "pointerenter" => EventKind::PointerEnter,
            "mouseleave" | "pointerleave" => EventKind::PointerLeave,
            "keydown" => EventKind::KeyDown,
            "keyup" => EventKind::KeyUp,
            "wheel" => EventKind::Wheel,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_key(self) -> bool {
        matches!(self, EventKind::KeyDown | EventKind::KeyUp)
    }
}

// ── PointerButton ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

impl PointerButton {
    /// DOM `MouseEvent.button` id: 0 = left, 1 = middle, 2 = right.
    pub fn from_dom(id: i32) -> Option<Self> {
        match id {
            0 => Some(PointerButton::Left),
            1 => Some(PointerButton::Middle),
            2 => Some(PointerButton::Right),
            _ => None,
        }
    }
}

// ── Modifiers ────────────────────────────────────────────────────

bitflags! {
    /// Keyboard modifier state carried by an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        const SHIFT   = 0b0001;
        const CONTROL = 0b0010;
        const ALT     = 0b0100;
    }
}

// ── InteractionEvent ─────────────────────────────────────────────

/// Canonical interaction event in canvas pixel space (origin top-left).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub kind: EventKind,
    /// Canvas-local position; absent for keyboard events.
    pub position: Option<(i32, i32)>,
    pub button: Option<PointerButton>,
    pub key: Option<String>,
    /// Modifier state, when the source reported it. `None` leaves the
    /// interactor's modifier state untouched.
    pub modifiers: Option<Modifiers>,
    pub wheel_delta: f64,
    /// Origin timestamp in milliseconds, when the source reported one.
    pub timestamp_ms: Option<f64>,
    pub is_touch: bool,
}

impl InteractionEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            position: None,
            button: None,
            key: None,
            modifiers: None,
            wheel_delta: 0.0,
            timestamp_ms: None,
            is_touch: false,
        }
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.position = Some((x, y));
        self
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = Some(modifiers);
        self
    }

    pub fn with_wheel_delta(mut self, delta: f64) -> Self {
        self.wheel_delta = delta;
        self
    }

    pub fn with_timestamp(mut self, ms: f64) -> Self {
        self.timestamp_ms = Some(ms);
        self
    }

    pub fn touch(mut self) -> Self {
        self.is_touch = true;
        self
    }

    /// Whether the key is a bare Shift, Control or Alt.
    pub fn is_modifier_key(&self) -> bool {
        matches!(self.key.as_deref(), Some("Shift" | "Control" | "Alt"))
    }
}
