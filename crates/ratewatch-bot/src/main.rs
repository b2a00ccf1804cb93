//! Ticker aggregation bot - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Polls price-ticker endpoints and prints debounced aggregated snapshots.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via RATEWATCH_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    ratewatch_telemetry::init_logging()?;

    info!("Starting ratewatch v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > RATEWATCH_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("RATEWATCH_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = ratewatch_bot::AppConfig::from_file(&config_path)?;

    let app = ratewatch_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
