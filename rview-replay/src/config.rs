//! Replay configuration.

use std::io::Write;
use std::path::{Path, PathBuf};

use rview_core::SessionConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration for a replay run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Bridge session settings.
    pub session: SessionConfig,
    /// Synthetic renderer settings.
    pub renderer: RendererConfig,
    /// Where frames and the report go.
    pub output: OutputConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Synthetic renderer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Initial canvas width.
    pub width: u32,
    /// Initial canvas height.
    pub height: u32,
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `frame-NNNNN.<ext>` files.
    pub frames_dir: PathBuf,
    /// JSON report path. Empty disables the file (the report is still
    /// printed).
    pub report: PathBuf,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 300,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            frames_dir: PathBuf::from("frames"),
            report: PathBuf::from("replay-report.json"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ReplayConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the default config to a new file. Fails with
    /// [`ErrorKind::AlreadyExists`](std::io::ErrorKind::AlreadyExists)
    /// rather than replacing an existing one.
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)?;
        let mut file = std::fs::OpenOptions::new().write(true).create_new(true).open(path)?;
        file.write_all(text.as_bytes())
    }
}

// ── Tests ────────────────────────────────────────────────────────
