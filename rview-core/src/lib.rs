//! # rview-core
//!
//! Core library for bridging an off-screen 3D renderer to a browser
//! canvas.
//!
//! This crate contains:
//! - **Bridge**: event normalization, the interaction state machine,
//!   throttled render scheduling, frame encoding, and the `Session`
//!   that ties them to a renderer and a display host
//! - **Clock**: injectable monotonic time for throttling and staleness
//! - **Error**: `BridgeError`, a typed, `thiserror`-based error hierarchy

pub mod bridge;
pub mod clock;
pub mod error;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use bridge::{
    DisplayHost, EncodedImage, EventOutcome, ImageFormat, InteractionEvent, InteractionPhase,
    Interactor, InteractorEvent, RawDomEvent, RenderOutcome, Renderer, Session, SessionConfig,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::BridgeError;
