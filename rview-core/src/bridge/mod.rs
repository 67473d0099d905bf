//! # The remote view bridge
//!
//! Streams frames from an off-screen renderer to a browser canvas and
//! relays browser interaction back to the renderer's interactor.
//!
//! ## Architecture
//!
//! ```text
//! HOST (browser widget)                        RENDERER
//! ┌──────────────────────┐                     ┌─────────────────────┐
//! │ DOM / touch events   │                     │ Interactor          │
//! │   ↓                  │                     │   ▲                 │
//! │ EventNormalizer      │                     │   │ inject          │
//! │   ↓                  │                     │   │                 │
//! │ InteractionStateMachine ──► RenderScheduler ──► FrameSource      │
//! │                      │          │          │   │ render / read   │
//! │ DisplayHost::deliver ◄── FrameEncoder ◄────────┘                 │
//! └──────────────────────┘                     └─────────────────────┘
//! ```
//!
//! ## Sub-modules
//!
//! | Module        | Purpose                                              |
//! |---------------|------------------------------------------------------|
//! | `types`       | Screen-space pixel buffers                            |
//! | `renderer`    | Renderer / interactor / display host traits           |
//! | `source`      | Weak-handle frame source adapter and event injection  |
//! | `encoder`     | JPEG / PNG frame encoder with validated quality       |
//! | `event`       | Raw DOM and canonical interaction events              |
//! | `normalize`   | Rescaling and touch synthesis                         |
//! | `delay`       | Adaptive quick-render delay controller                |
//! | `throttle`    | Drop-if-too-soon rate limiter                         |
//! | `scheduler`   | Full / quick render paths and move coalescing         |
//! | `machine`     | Interaction state machine                             |
//! | `diagnostics` | Event and timing recorder                             |
//! | `session`     | Session configuration and lifecycle                   |

pub mod delay;
pub mod diagnostics;
pub mod encoder;
pub mod event;
pub mod machine;
pub mod normalize;
pub mod renderer;
pub mod scheduler;
pub mod session;
pub mod source;
pub mod throttle;
pub mod types;

// ── Re-exports ───────────────────────────────────────────────────

pub use delay::{DelayAdjustment, RenderDelayController};
pub use diagnostics::{DEFAULT_DIAGNOSTICS_CAPACITY, Diagnostics, StalenessSample};
pub use encoder::{EncodedImage, FrameEncoder, ImageFormat, Quality};
pub use event::{EventKind, InteractionEvent, Modifiers, PointerButton, RawDomEvent};
pub use machine::{DragState, EventOutcome, InteractionPhase, InteractionStateMachine, MachineOptions};
pub use normalize::EventNormalizer;
pub use renderer::{DisplayHost, Interactor, InteractorEvent, Renderer};
pub use scheduler::{RenderOutcome, RenderScheduler};
pub use session::{Session, SessionConfig};
pub use source::{FrameSource, key_to_sym};
pub use throttle::RateLimiter;
pub use types::{PixelFormat, RawPixels};
