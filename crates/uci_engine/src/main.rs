//! UCI front end for the PVS engine.

mod config;
mod session;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use pvs_engine::PvsEngine;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{ConfigSource, EngineConfig};
use session::{Flow, Output, UciSession};

#[derive(Parser, Debug)]
#[command(version, about = "UCI chess engine")]
struct Args {
    /// Configuration file (TOML). Overrides UCI_ENGINE_CONFIG and ./engine.toml.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_logging(config: &EngineConfig) {
    // stdout belongs to the UCI protocol.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.as_deref().unwrap_or("warn")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    let (config, source) = EngineConfig::resolve(args.config.as_deref())?;
    init_logging(&config);

    match &source {
        ConfigSource::Defaults => info!("no config file, using defaults"),
        ConfigSource::File(path) => info!(path = %path.display(), "loaded config"),
        ConfigSource::IgnoredDefaultFile(path, err) => {
            warn!(path = %path.display(), error = %format!("{err:#}"), "ignoring config file");
        }
    }

    chess_core::init();
    // The network has to be in place before the first position is built.
    if let Some(path) = &config.eval_file {
        if let Err(err) = chess_core::load_network(path) {
            warn!(path = %path.display(), %err, "network not loaded, evaluating 0");
        }
    }

    let engine = PvsEngine::new(config.hash_mb);
    let out: Output = Arc::new(Mutex::new(Box::new(io::stdout())));
    let mut session =
        UciSession::new(engine, Duration::from_millis(config.move_overhead_ms), out);

    for line in io::stdin().lock().lines() {
        let line = line?;
        if session.handle_line(line.trim()) == Flow::Quit {
            break;
        }
    }
    Ok(())
}
