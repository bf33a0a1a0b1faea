//! Configuration management for plex-metrics
//!
//! A [`CollectionConfig`] is built once per run, either from command-line
//! arguments or from the options of the collectd `<Plugin plex>` block, and
//! passed by reference to everything that needs it.

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A plugin option carries a value of the wrong type
    #[error("Invalid value for \"{key}\": expected {expected}")]
    InvalidOption { key: String, expected: &'static str },

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Metric categories that can be requested
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Categories {
    pub movies: bool,
    pub shows: bool,
    pub episodes: bool,
    pub sessions: bool,
    pub myplex_reachability: bool,
}

impl Categories {
    /// Every category enabled
    pub fn all() -> Self {
        Self {
            movies: true,
            shows: true,
            episodes: true,
            sessions: true,
            myplex_reachability: true,
        }
    }

    pub fn any(&self) -> bool {
        self.wants_media() || self.sessions || self.myplex_reachability
    }

    /// Whether library sections have to be fetched at all
    pub fn wants_media(&self) -> bool {
        self.movies || self.shows || self.episodes
    }

    /// True when remote reachability is the only thing requested
    pub fn only_reachability(&self) -> bool {
        self.myplex_reachability && !self.wants_media() && !self.sessions
    }
}

/// Resolved settings for one collection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionConfig {
    pub host: String,
    pub port: u16,
    pub https: bool,
    pub auth_token: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    pub categories: Categories,
    /// Section keys to restrict collection to (empty means all)
    pub include: Vec<String>,
    /// Section keys to skip
    pub exclude: Vec<String>,
}

impl CollectionConfig {
    pub fn new(host: impl Into<String>, port: u16, auth_token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            https: true,
            auth_token: auth_token.into(),
            timeout_ms: default_timeout(),
            categories: Categories::default(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn with_https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    pub fn with_categories(mut self, categories: Categories) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_include<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.include = normalize_keys(keys);
        self
    }

    pub fn with_exclude<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude = normalize_keys(keys);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// URL scheme derived from the TLS flag
    pub fn scheme(&self) -> &'static str {
        if self.https {
            "https"
        } else {
            "http"
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Missing \"Host\" parameter".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(ConfigError::ValidationError(
                "Port must be greater than 0".to_string(),
            ));
        }

        if self.auth_token.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Missing \"AuthToken\" parameter".to_string(),
            ));
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if !self.categories.any() {
            return Err(ConfigError::ValidationError(
                "No metrics configured to be collected".to_string(),
            ));
        }

        Ok(())
    }
}

/// Options of the collectd plugin block, before required keys are checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub auth_token: Option<String>,
    pub https: bool,
    pub movies: bool,
    pub shows: bool,
    pub episodes: bool,
    pub sessions: bool,
    pub myplex_reachability: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

fn default_timeout() -> u64 {
    5000
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            auth_token: None,
            https: true,
            movies: true,
            shows: true,
            episodes: true,
            sessions: true,
            myplex_reachability: false,
            include: Vec::new(),
            exclude: Vec::new(),
            timeout_ms: default_timeout(),
        }
    }
}

impl PluginConfig {
    /// Enforce required parameters and convert into a validated run configuration
    pub fn resolve(self) -> Result<CollectionConfig, ConfigError> {
        let host = self
            .host
            .ok_or_else(|| ConfigError::ValidationError("Missing \"Host\" parameter".to_string()))?;
        let port = self
            .port
            .ok_or_else(|| ConfigError::ValidationError("Missing \"Port\" parameter".to_string()))?;
        let auth_token = self.auth_token.ok_or_else(|| {
            ConfigError::ValidationError("Missing \"AuthToken\" parameter".to_string())
        })?;

        let config = CollectionConfig::new(host, port, auth_token)
            .with_https(self.https)
            .with_categories(Categories {
                movies: self.movies,
                shows: self.shows,
                episodes: self.episodes,
                sessions: self.sessions,
                myplex_reachability: self.myplex_reachability,
            })
            .with_include(self.include)
            .with_exclude(self.exclude)
            .with_timeout_ms(self.timeout_ms);
        config.validate()?;
        Ok(config)
    }
}

/// Trim section keys and drop blanks
fn normalize_keys<I, S>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keys.into_iter()
        .map(|k| k.as_ref().trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CollectionConfig {
        CollectionConfig::new("plex.local", 32400, "token").with_categories(Categories {
            sessions: true,
            ..Categories::default()
        })
    }

    #[test]
    fn test_defaults() {
        let config = CollectionConfig::new("plex.local", 32400, "token");
        assert!(config.https);
        assert_eq!(config.scheme(), "https");
        assert_eq!(config.timeout_ms, 5000);
        assert!(config.include.is_empty());
        assert!(config.exclude.is_empty());
    }

    #[test]
    fn test_validation_requires_category() {
        let config = CollectionConfig::new("plex.local", 32400, "token");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("No metrics configured"));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_fields() {
        let mut config = valid();
        config.port = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.host = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.auth_token = String::new();
        assert!(config.validate().is_err());

        assert!(valid().with_timeout_ms(0).validate().is_err());
    }

    #[test]
    fn test_section_keys_are_trimmed() {
        let config = valid()
            .with_include([" 1", "", "2 "])
            .with_exclude(["3"]);
        assert_eq!(config.include, vec!["1", "2"]);
        assert_eq!(config.exclude, vec!["3"]);
    }

    #[test]
    fn test_categories_helpers() {
        assert!(!Categories::default().any());
        assert!(Categories::all().wants_media());

        let only = Categories {
            myplex_reachability: true,
            ..Categories::default()
        };
        assert!(only.only_reachability());
        assert!(!Categories::all().only_reachability());
    }

    fn plugin_config() -> PluginConfig {
        PluginConfig {
            host: Some("plex.local".to_string()),
            port: Some(32400),
            auth_token: Some("abc123".to_string()),
            ..PluginConfig::default()
        }
    }

    #[test]
    fn test_plugin_config_defaults() {
        let config = plugin_config().resolve().unwrap();

        assert!(config.https);
        assert!(config.categories.movies);
        assert!(config.categories.shows);
        assert!(config.categories.episodes);
        assert!(config.categories.sessions);
        assert!(!config.categories.myplex_reachability);
        assert_eq!(config.timeout_ms, 5000);
    }

    #[test]
    fn test_plugin_config_full() {
        let config = PluginConfig {
            port: Some(32401),
            https: false,
            movies: false,
            shows: false,
            episodes: false,
            myplex_reachability: true,
            include: vec!["1".to_string(), " 4".to_string()],
            exclude: vec!["4".to_string()],
            timeout_ms: 2500,
            ..plugin_config()
        }
        .resolve()
        .unwrap();

        assert_eq!(config.port, 32401);
        assert_eq!(config.scheme(), "http");
        assert!(!config.categories.wants_media());
        assert!(config.categories.myplex_reachability);
        assert_eq!(config.include, vec!["1", "4"]);
        assert_eq!(config.exclude, vec!["4"]);
        assert_eq!(config.timeout_ms, 2500);
    }

    #[test]
    fn test_plugin_config_missing_required() {
        let err = PluginConfig {
            auth_token: None,
            ..plugin_config()
        }
        .resolve()
        .unwrap_err();
        assert!(err.to_string().contains("AuthToken"));

        let err = PluginConfig {
            host: None,
            ..plugin_config()
        }
        .resolve()
        .unwrap_err();
        assert!(err.to_string().contains("Host"));

        let err = PluginConfig::default().resolve().unwrap_err();
        assert!(err.to_string().contains("Host"));
    }

    #[test]
    fn test_plugin_config_nothing_selected() {
        let err = PluginConfig {
            movies: false,
            shows: false,
            episodes: false,
            sessions: false,
            ..plugin_config()
        }
        .resolve()
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("No metrics configured"));
    }

    #[test]
    fn test_invalid_option_display() {
        let err = ConfigError::InvalidOption {
            key: "Port".to_string(),
            expected: "a port number",
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for \"Port\": expected a port number"
        );
    }
}
