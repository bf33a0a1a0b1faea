//! Metric sinks
//!
//! The collector hands every metric to a [`MetricSink`] and does not know
//! which one is active. [`ConsoleSink`] prints JSON records for interactive
//! use; the `plex-collectd` plugin dispatches through collectd's value API.

use serde::Serialize;
use std::io::{self, Write};

/// Plugin name reported to collectd
pub const PLUGIN: &str = "plex";
/// collectd data set type of every value
pub const TYPE: &str = "gauge";

/// Destination for collected gauges
pub trait MetricSink {
    /// Emit one gauge value
    fn emit(&mut self, type_instance: &str, plugin_instance: &str, value: f64) -> io::Result<()>;

    /// Flush buffered output, called once per collection run
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// `plex-<plugin_instance>.<type_instance>.value`
pub fn full_name(plugin_instance: &str, type_instance: &str) -> String {
    format!("{}-{}.{}.value", PLUGIN, plugin_instance, type_instance)
}

#[derive(Debug, Serialize)]
struct ConsoleRecord<'a> {
    value: f64,
    type_instance: &'a str,
    plugin_instance: &'a str,
    full_name: String,
}

/// Prints one JSON object per metric
pub struct ConsoleSink<W: Write> {
    writer: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricSink for ConsoleSink<W> {
    fn emit(&mut self, type_instance: &str, plugin_instance: &str, value: f64) -> io::Result<()> {
        let record = ConsoleRecord {
            value,
            type_instance,
            plugin_instance,
            full_name: full_name(plugin_instance, type_instance),
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        writeln!(self.writer)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
