//! plex-metrics - Plex Media Server metrics, interactive mode
//!
//! Collects the requested gauges once and prints one JSON record per metric.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::error;

use plex_metrics::{cli::Cli, collector::Collector, sink::ConsoleSink};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    if let Err(e) = plex_metrics::init_logging(cli.log_level) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Collection failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let collector = Collector::new(cli.to_config())?;
    let mut sink = ConsoleSink::stdout();
    collector.run(&mut sink).await?;
    Ok(())
}
