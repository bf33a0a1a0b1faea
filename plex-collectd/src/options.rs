//! `<Plugin plex>` block parsing
//!
//! ```text
//! <Plugin plex>
//!     Host "plex.local"
//!     Port 32400
//!     AuthToken "abc123"
//!     HTTPS false
//!     Episodes false
//!     Include "1" "4"
//!     MyPlexReachability true
//! </Plugin>
//! ```
//!
//! Keys are case-insensitive. Unknown keys are logged and ignored.

use collectd_plugin::{ConfigItem, ConfigValue};
use tracing::warn;

use plex_metrics::config::{CollectionConfig, ConfigError, PluginConfig};

/// Build a validated run configuration from the plugin block
pub fn collection_config(items: &[ConfigItem<'_>]) -> Result<CollectionConfig, ConfigError> {
    let mut options = PluginConfig::default();
    for item in items {
        apply(&mut options, item)?;
    }
    options.resolve()
}

fn apply(options: &mut PluginConfig, item: &ConfigItem<'_>) -> Result<(), ConfigError> {
    match item.key.to_ascii_lowercase().as_str() {
        "host" => options.host = Some(string(item)?),
        "port" => options.port = Some(port(item)?),
        "authtoken" => options.auth_token = Some(string(item)?),
        "https" => options.https = boolean(item)?,
        "movies" => options.movies = boolean(item)?,
        "shows" => options.shows = boolean(item)?,
        "episodes" => options.episodes = boolean(item)?,
        "sessions" => options.sessions = boolean(item)?,
        "myplexreachability" => options.myplex_reachability = boolean(item)?,
        "include" => options.include.extend(strings(item)?),
        "exclude" => options.exclude.extend(strings(item)?),
        "timeout" | "timeoutms" => options.timeout_ms = timeout(item)?,
        _ => warn!(key = item.key, "Unknown configuration key"),
    }
    Ok(())
}

fn invalid(item: &ConfigItem<'_>, expected: &'static str) -> ConfigError {
    ConfigError::InvalidOption {
        key: item.key.to_string(),
        expected,
    }
}

// Unquoted numbers arrive as `Number`, e.g. `Include 1 2`.
fn text(value: &ConfigValue<'_>) -> Option<String> {
    match value {
        ConfigValue::String(s) => Some(s.to_string()),
        ConfigValue::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(format!("{}", n)),
        _ => None,
    }
}

fn string(item: &ConfigItem<'_>) -> Result<String, ConfigError> {
    item.values
        .first()
        .and_then(text)
        .ok_or_else(|| invalid(item, "a string"))
}

fn strings(item: &ConfigItem<'_>) -> Result<Vec<String>, ConfigError> {
    item.values
        .iter()
        .map(|value| text(value).ok_or_else(|| invalid(item, "section keys")))
        .collect()
}

fn boolean(item: &ConfigItem<'_>) -> Result<bool, ConfigError> {
    match item.values.first() {
        Some(ConfigValue::Boolean(b)) => Ok(*b),
        Some(ConfigValue::String(s)) if s.eq_ignore_ascii_case("true") => Ok(true),
        Some(ConfigValue::String(s)) if s.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(invalid(item, "true or false")),
    }
}

fn port(item: &ConfigItem<'_>) -> Result<u16, ConfigError> {
    string(item)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid(item, "a port number"))
}

fn timeout(item: &ConfigItem<'_>) -> Result<u64, ConfigError> {
    string(item)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid(item, "milliseconds"))
}
