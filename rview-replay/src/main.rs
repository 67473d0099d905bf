//! rview-replay entry point.
//!
//! ```text
//! rview-replay --events <log.jsonl>              Replay on a virtual clock
//! rview-replay --events <log.jsonl> --realtime   Keep the recorded spacing
//! rview-replay --config <path> --out <dir> ...   Custom config / frame dir
//! rview-replay --gen-config [--config <path>]   Write a default config and exit
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rview_replay::config::ReplayConfig;
use rview_replay::replay::{load_records, replay, replay_realtime};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rview-replay", about = "Replay a recorded remote-view interaction log")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "rview-replay.toml")]
    config: PathBuf,

    /// JSON-lines event log to replay.
    #[arg(short, long, required_unless_present = "gen_config")]
    events: Option<PathBuf>,

    /// Frame output directory (overrides config).
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Write the default configuration to `--config` and exit. An
    /// existing file is left untouched.
    #[arg(long)]
    gen_config: bool,

    /// Sleep between records to reproduce the recorded timing.
    #[arg(long)]
    realtime: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        if let Err(e) = ReplayConfig::write_default(&cli.config) {
            return Err(format!("cannot write {}: {e}", cli.config.display()).into());
        }
        println!("default config written to {}", cli.config.display());
        return Ok(());
    }

    let mut config = ReplayConfig::load(&cli.config);
    if let Some(dir) = cli.out {
        config.output.frames_dir = dir;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("rview-replay v{}", env!("CARGO_PKG_VERSION"));

    let Some(events) = cli.events else {
        return Err("--events is required".into());
    };
    let records = load_records(&events)?;
    info!("{} records from {}", records.len(), events.display());

    let frames_dir = config.output.frames_dir.clone();
    let report = if cli.realtime {
        replay_realtime(&config, &frames_dir, &records).await?
    } else {
        replay(&config, &frames_dir, &records)?
    };

    if let Some(e) = &report.last_error {
        error!("session ended with error: {e}");
    }
    if !config.output.report.as_os_str().is_empty() {
        report.write(&config.output.report)?;
        info!("report written to {}", config.output.report.display());
    }
    println!("{}", report.to_json()?);
    Ok(())
}
