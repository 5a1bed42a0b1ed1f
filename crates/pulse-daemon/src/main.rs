//! Market pulse daemon entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Market-state tracking and intraday analytics daemon.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PULSE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    pulse_telemetry::init_logging()?;

    info!("Starting pulse daemon v{}", env!("CARGO_PKG_VERSION"));

    // Determine config path: CLI arg > PULSE_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("PULSE_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let config = if std::path::Path::new(&config_path).exists() {
        pulse_daemon::AppConfig::from_file(&config_path)?
    } else {
        tracing::warn!(path = %config_path, "Config file not found, using defaults");
        pulse_daemon::AppConfig::default()
    };
    info!(
        markets = config.markets.len(),
        symbols = config.symbols.len(),
        tick_ms = config.heartbeat.tick_ms,
        "Configuration loaded"
    );

    let app = pulse_daemon::Application::new(config)?;
    app.run().await?;

    Ok(())
}
