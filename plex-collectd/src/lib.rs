//! plex-collectd - collectd read plugin for Plex Media Server metrics
//!
//! Build with `cargo build --release -p plex-collectd`, copy `libplex.so` to
//! collectd's plugin directory as `plex.so` and configure it:
//!
//! ```text
//! LoadPlugin plex
//! <Plugin plex>
//!     Host "plex.local"
//!     Port 32400
//!     AuthToken "abc123"
//! </Plugin>
//! ```
//!
//! collectd calls the read callback once per interval. Each call runs one
//! collection against the server and submits every gauge; a failed run is
//! reported to collectd and retried on the next interval.

mod logging;
mod options;
mod sink;

pub use options::collection_config;
pub use sink::CollectdSink;

use anyhow::Context;
use collectd_plugin::{
    collectd_plugin, ConfigItem, Plugin, PluginCapabilities, PluginManager, PluginRegistration,
};
use std::error;
use tracing::{debug, info};

use plex_metrics::collector::Collector;
use plex_metrics::config::CollectionConfig;
use plex_metrics::sink::PLUGIN;

/// Registers the plex read plugin from the `<Plugin plex>` block
pub struct PlexManager;

impl PluginManager for PlexManager {
    fn name() -> &'static str {
        PLUGIN
    }

    fn plugins(
        config: Option<&[ConfigItem<'_>]>,
    ) -> Result<PluginRegistration, Box<dyn error::Error>> {
        logging::init();

        let config = collection_config(config.unwrap_or_default())?;
        info!(
            host = %config.host,
            port = config.port,
            https = config.https,
            "Configured plex plugin"
        );

        Ok(PluginRegistration::Single(Box::new(PlexPlugin::new(config))))
    }
}

/// Read plugin holding the resolved configuration
///
/// Every read builds its own client and runtime, so nothing carries over
/// between collection runs.
#[derive(Debug)]
pub struct PlexPlugin {
    config: CollectionConfig,
}

impl PlexPlugin {
    pub fn new(config: CollectionConfig) -> Self {
        Self { config }
    }

    /// Run one collection and submit the results, returning the metric count
    pub fn collect_once(&self) -> anyhow::Result<usize> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;

        let count = runtime.block_on(async {
            let collector = Collector::new(self.config.clone())?;
            collector.run(&mut CollectdSink).await
        })?;

        Ok(count)
    }
}

impl Plugin for PlexPlugin {
    fn capabilities(&self) -> PluginCapabilities {
        PluginCapabilities::READ
    }

    fn read_values(&self) -> Result<(), Box<dyn error::Error>> {
        let count = self.collect_once()?;
        debug!(count, "Submitted metrics");
        Ok(())
    }
}

collectd_plugin!(PlexManager);
