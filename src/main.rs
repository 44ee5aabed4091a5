//! Gaze GW - staged eye-tracker configuration gateway
//!
//! Walks a capture device through endpoint → project → participant →
//! calibration → recording before data collection starts.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gaze_gw::cli;
use gaze_gw::config::AppConfig;
use gaze_gw::connection::StagedConnection;
use gaze_gw::session::DeviceHub;

/// Gaze GW - configure eye trackers for recording sessions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "gaze.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Connect to the configured capture endpoint before starting the REPL
    #[arg(long)]
    connect: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level)?;

    info!("Starting Gaze GW...");
    info!("Configuration file: {}", args.config);

    let config = AppConfig::load_or_default(&args.config).await?;

    // Real device adapters plug in through the hub factory; the default hub
    // runs the built-in in-memory device, enough to rehearse a session.
    let hub = Arc::new(DeviceHub::in_memory());
    let mut conn = StagedConnection::new(hub);

    if args.connect {
        match conn.commit_endpoint(&config.capture.endpoint).await {
            Ok(_) => info!("✅ Connected to {}", config.capture.endpoint),
            Err(err) => warn!("{err}"),
        }
    } else {
        info!("Capture endpoint from config: {}", config.capture.endpoint);
    }

    cli::run_repl(&mut conn).await?;

    info!("Gaze GW shutdown complete");
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}
