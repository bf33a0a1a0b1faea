//! plex-metrics library
//!
//! This crate polls a Plex Media Server for library and session counts and
//! reports them as gauges, either to collectd or to the console.

pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod metrics;
pub mod sink;

use anyhow::Result;
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::cli::LogLevel;

/// Initialize the logging subsystem
///
/// Logs go to stderr; stdout is reserved for metric output. `RUST_LOG`
/// overrides `level` when set.
///
/// # Errors
/// Returns an error if the logging system fails to initialize
pub fn init_logging(level: LogLevel) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level_filter(level).into()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Most verbose level that `level` lets through
pub fn level_filter(level: LogLevel) -> LevelFilter {
    LevelFilter::from_level(level.into())
}
