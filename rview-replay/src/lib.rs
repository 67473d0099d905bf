//! # rview-replay: interaction log replayer
//!
//! Drives an `rview-core` session from a recorded JSON-lines log of
//! browser events. Frames go to a directory on disk; a JSON report
//! summarises the session once the log is exhausted.

pub mod config;
pub mod host;
pub mod renderer;
pub mod replay;
