//! CLI argument parsing for plex-metrics
//!
//! `plex-metrics HOST PORT AUTH_TOKEN [flags]` collects once and prints one
//! JSON record per metric. The collectd plugin takes its options from the
//! `<Plugin plex>` block instead.

use clap::{ArgAction, Parser, ValueEnum};

use crate::config::{Categories, CollectionConfig};

/// Collect metrics from Plex Media Server
#[derive(Parser, Debug)]
#[command(name = "plex-metrics")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// PMS hostname
    #[arg(value_name = "HOSTNAME")]
    pub host: String,

    /// PMS port
    #[arg(value_name = "PORT")]
    pub port: u16,

    /// plex.tv authentication token
    #[arg(value_name = "AUTH_TOKEN")]
    pub auth_token: String,

    /// Use HTTPS instead of HTTP
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    pub https: bool,

    /// Collect session counts
    #[arg(long)]
    pub sessions: bool,

    /// Collect movie count(s)
    #[arg(long)]
    pub movies: bool,

    /// Collect show count(s)
    #[arg(long)]
    pub shows: bool,

    /// Collect episode count(s)
    #[arg(long)]
    pub episodes: bool,

    /// Collect remote access reachability
    #[arg(long)]
    pub myplex_reachability: bool,

    /// Section(s) to collect from
    #[arg(short, long, value_name = "SECTION", num_args = 1..)]
    pub include: Vec<String>,

    /// Section(s) to exclude collecting from
    #[arg(short, long, value_name = "SECTION", num_args = 1..)]
    pub exclude: Vec<String>,

    /// HTTP timeout in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 5000, env = "PLEX_TIMEOUT_MS")]
    pub timeout_ms: u64,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "warn",
        env = "PLEX_LOG_LEVEL"
    )]
    pub log_level: LogLevel,
}

impl Cli {
    /// Build the run configuration from the parsed arguments
    pub fn to_config(&self) -> CollectionConfig {
        CollectionConfig::new(&self.host, self.port, &self.auth_token)
            .with_https(self.https)
            .with_categories(Categories {
                movies: self.movies,
                shows: self.shows,
                episodes: self.episodes,
                sessions: self.sessions,
                myplex_reachability: self.myplex_reachability,
            })
            .with_include(&self.include)
            .with_exclude(&self.exclude)
            .with_timeout_ms(self.timeout_ms)
    }
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warn level
    Warn,
    /// Error level - least verbose
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(tracing::Level::from(LogLevel::Trace), tracing::Level::TRACE);
        assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
        assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["plex-metrics", "plex.local", "32400", "token"]);
        assert_eq!(cli.host, "plex.local");
        assert_eq!(cli.port, 32400);
        assert_eq!(cli.auth_token, "token");
        assert!(cli.https);
        assert!(!cli.sessions);
        assert!(!cli.movies);
        assert!(!cli.shows);
        assert!(!cli.episodes);
        assert!(!cli.myplex_reachability);
        assert!(cli.include.is_empty());
        assert!(cli.exclude.is_empty());
        assert_eq!(cli.timeout_ms, 5000);
        assert_eq!(cli.log_level, LogLevel::Warn);

        // Nothing selected, so the resolved config must not validate.
        assert!(cli.to_config().validate().is_err());
    }

    #[test]
    fn test_cli_with_options() {
        let cli = Cli::parse_from([
            "plex-metrics",
            "plex.local",
            "32400",
            "token",
            "--https",
            "false",
            "--movies",
            "--episodes",
            "-i",
            "1",
            "2",
            "-e",
            "2",
            "--timeout-ms",
            "1500",
        ]);

        let config = cli.to_config();
        assert_eq!(config.scheme(), "http");
        assert!(config.categories.movies);
        assert!(config.categories.episodes);
        assert!(!config.categories.shows);
        assert_eq!(config.include, vec!["1", "2"]);
        assert_eq!(config.exclude, vec!["2"]);
        assert_eq!(config.timeout_ms, 1500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_requires_positionals() {
        assert!(Cli::try_parse_from(["plex-metrics", "plex.local"]).is_err());
        assert!(Cli::try_parse_from(["plex-metrics", "plex.local", "port", "token"]).is_err());
    }
}
