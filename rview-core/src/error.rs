//! Domain-specific error types for the remote view bridge.
//!
//! Configuration problems fail fast at construction. Everything that can
//! go wrong while a session is live (renderer gone, bad frame, codec
//! failure) is typed here so the render paths can record it and carry on.

use thiserror::Error;

/// The canonical error type for the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    // ── Configuration ────────────────────────────────────────────
    /// A construction-time parameter was out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Renderer ─────────────────────────────────────────────────
    /// The renderer behind the session's weak handle has been dropped.
    #[error("renderer is no longer available")]
    RendererUnavailable,

    /// The renderer failed to produce a frame or pixel buffer.
    #[error("render failed: {0}")]
    RenderFailure(String),

    // ── Encoding ─────────────────────────────────────────────────
    /// The image codec rejected the frame.
    #[error("encode failed: {0}")]
    EncodeFailure(String),

    // ── Events ───────────────────────────────────────────────────
    /// A raw browser event could not be parsed.
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    // ── Lifecycle ────────────────────────────────────────────────
    /// The session was already closed.
    #[error("session is closed")]
    SessionClosed,
}

impl BridgeError {
    /// Shorthand for an [`InvalidConfig`](Self::InvalidConfig) error.
    pub fn config(msg: impl Into<String>) -> Self {
        BridgeError::InvalidConfig(msg.into())
    }

    /// Whether the error is scoped to a single frame or event and the
    /// session can keep running.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BridgeError::InvalidConfig(_) | BridgeError::SessionClosed)
    }
}

// ── Convenient From implementations ──────────────────────────────

impl From<image::ImageError> for BridgeError {
    fn from(e: image::ImageError) -> Self {
        BridgeError::EncodeFailure(e.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::InvalidEvent(e.to_string())
    }
}
