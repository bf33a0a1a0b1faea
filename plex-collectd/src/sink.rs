//! Dispatch through collectd's value API

use collectd_plugin::{Value, ValueListBuilder};
use std::io;

use plex_metrics::sink::{MetricSink, PLUGIN, TYPE};

/// Submits every metric as a `plex-<server>/gauge-<type_instance>` value list.
///
/// Host name and interval are filled in by collectd.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollectdSink;

impl MetricSink for CollectdSink {
    fn emit(&mut self, type_instance: &str, plugin_instance: &str, value: f64) -> io::Result<()> {
        let values = [Value::Gauge(value)];
        ValueListBuilder::new(PLUGIN, TYPE)
            .plugin_instance(plugin_instance)
            .type_instance(type_instance)
            .values(&values)
            .submit()
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plex_metrics::collector::Collection;
    use plex_metrics::metrics::Metric;

    #[test]
    fn test_emit_submits_gauge() {
        let mut sink = CollectdSink;
        assert!(sink.emit("sessions-total", "basement", 3.0).is_ok());
        assert!(sink.emit("remote-reachability", "basement", -1.0).is_ok());
    }

    #[test]
    fn test_collection_dispatch() {
        let collection = Collection {
            server_name: "basement".to_string(),
            metrics: vec![
                Metric::new("movies-1", 42.0),
                Metric::new("episodes-2", 188.0),
            ],
        };

        assert_eq!(collection.dispatch(&mut CollectdSink).unwrap(), 2);
    }
}
