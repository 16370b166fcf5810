//! Load balancer entry point.

use std::path::PathBuf;

use clap::Parser;

use ingest_balancer::config::{load_config, BalancerConfig};
use ingest_balancer::lifecycle::startup;
use ingest_balancer::observability;

#[derive(Parser)]
#[command(name = "ingest-balancer")]
#[command(about = "Round-robin load balancer with asynchronous ingestion", long_about = None)]
struct Cli {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BalancerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    observability::init_logging(&config.observability);
    tracing::info!("ingest-balancer v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
