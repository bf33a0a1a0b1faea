//! tracing output routed into collectd's log
//!
//! Each formatted event becomes one `plugin_log` call at the matching
//! severity. Timestamps and colours are left to collectd.

use collectd_plugin::{collectd_log, LogLevel};
use std::io;
use tracing::{Level, Metadata};
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// collectd severity for a tracing level
pub fn log_level(level: &Level) -> LogLevel {
    match *level {
        Level::ERROR => LogLevel::Error,
        Level::WARN => LogLevel::Warning,
        Level::INFO => LogLevel::Info,
        _ => LogLevel::Debug,
    }
}

/// Buffers one event and hands it to collectd when dropped
pub struct CollectdLogWriter {
    level: Level,
    buf: Vec<u8>,
}

impl io::Write for CollectdLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for CollectdLogWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let message = String::from_utf8_lossy(&self.buf);
        collectd_log(log_level(&self.level), message.trim_end());
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CollectdLog;

impl<'a> MakeWriter<'a> for CollectdLog {
    type Writer = CollectdLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CollectdLogWriter {
            level: Level::INFO,
            buf: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        CollectdLogWriter {
            level: *meta.level(),
            buf: Vec::new(),
        }
    }
}

/// Install the collectd log subscriber, once per process
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // collectd may call the config callback again after a reload.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(CollectdLog)
                .with_ansi(false)
                .with_target(false)
                .without_time(),
        )
        .try_init();
}
