//! Plex HTTP client
//!
//! Issues sequential GET requests against a fixed set of Plex endpoints.
//! There are no retries: the first failure aborts the run.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::config::{CollectionConfig, ConfigError};
use crate::error::{CollectResult, CollectorError};

pub const SERVER_IDENTITY_PATH: &str = "/";
pub const LIBRARY_SECTIONS_PATH: &str = "/library/sections";
pub const SESSIONS_PATH: &str = "/status/sessions";
pub const MYPLEX_ACCOUNT_PATH: &str = "/myplex/account";

const TOKEN_HEADER: &str = "X-Plex-Token";

/// Items of one library section
pub fn section_items_path(key: &str) -> String {
    format!("/library/sections/{}/all", key)
}

/// Body format requested from the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Xml,
}

impl ResponseFormat {
    fn accept(self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/json",
            ResponseFormat::Xml => "application/xml",
        }
    }

    fn name(self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
            ResponseFormat::Xml => "xml",
        }
    }
}

/// Decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    Json(Value),
    Xml(String),
}

/// Plex Media Server HTTP client
#[derive(Clone)]
pub struct PlexClient {
    client: Client,
    base_url: Url,
    timeout_ms: u64,
}

impl PlexClient {
    /// Create a client for the server described by `config`
    ///
    /// # Example
    /// ```ignore
    /// let config = CollectionConfig::new("plex.local", 32400, "token");
    /// let client = PlexClient::new(&config)?;
    /// ```
    pub fn new(config: &CollectionConfig) -> CollectResult<Self> {
        let base_url = Url::parse(&format!(
            "{}://{}:{}",
            config.scheme(),
            config.host,
            config.port
        ))
        .map_err(|e| ConfigError::ValidationError(format!("Invalid server address: {}", e)))?;

        let mut token = HeaderValue::from_str(&config.auth_token).map_err(|_| {
            ConfigError::ValidationError("Auth token contains invalid characters".to_string())
        })?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, token);

        let client = ClientBuilder::new()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(CollectorError::ClientInit)?;

        Ok(Self {
            client,
            base_url,
            timeout_ms: config.timeout_ms,
        })
    }

    /// Absolute URL for an API path
    pub fn url_for(&self, path: &str) -> CollectResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CollectorError::parse(path, "url", e))
    }

    /// GET `path` and decode the body in the requested format
    #[instrument(skip(self))]
    pub async fn request(&self, path: &str, format: ResponseFormat) -> CollectResult<RawResponse> {
        let url = self.url_for(path)?;
        debug!(url = %url, "Sending Plex request");

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, format.accept())
            .send()
            .await
            .map_err(|e| self.transport_error(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollectorError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(url.as_str(), e))?;

        match format {
            ResponseFormat::Json => serde_json::from_str(&body)
                .map(RawResponse::Json)
                .map_err(|e| CollectorError::parse(path, format.name(), e)),
            ResponseFormat::Xml => Ok(RawResponse::Xml(body)),
        }
    }

    /// GET `path` as JSON
    pub async fn get_json(&self, path: &str) -> CollectResult<Value> {
        match self.request(path, ResponseFormat::Json).await? {
            RawResponse::Json(value) => Ok(value),
            RawResponse::Xml(_) => Err(CollectorError::parse(path, "json", "unexpected XML body")),
        }
    }

    /// GET `path` as raw XML text
    pub async fn get_xml(&self, path: &str) -> CollectResult<String> {
        match self.request(path, ResponseFormat::Xml).await? {
            RawResponse::Xml(body) => Ok(body),
            RawResponse::Json(_) => Err(CollectorError::parse(path, "xml", "unexpected JSON body")),
        }
    }

    pub async fn server_identity(&self) -> CollectResult<Value> {
        self.get_json(SERVER_IDENTITY_PATH).await
    }

    pub async fn library_sections(&self) -> CollectResult<Value> {
        self.get_json(LIBRARY_SECTIONS_PATH).await
    }

    pub async fn section_items(&self, key: &str) -> CollectResult<Value> {
        self.get_json(&section_items_path(key)).await
    }

    pub async fn sessions(&self) -> CollectResult<String> {
        self.get_xml(SESSIONS_PATH).await
    }

    pub async fn myplex_account(&self) -> CollectResult<Value> {
        self.get_json(MYPLEX_ACCOUNT_PATH).await
    }

    fn transport_error(&self, url: &str, err: reqwest::Error) -> CollectorError {
        if err.is_timeout() {
            CollectorError::timeout_with_duration(self.timeout_ms)
        } else {
            CollectorError::Transport {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CollectionConfig {
        CollectionConfig::new("plex.local", 32400, "secret")
    }

    #[test]
    fn test_client_new() {
        assert!(PlexClient::new(&config()).is_ok());
    }

    #[test]
    fn test_url_for_https() {
        let client = PlexClient::new(&config()).unwrap();
        assert_eq!(
            client.url_for("/library/sections").unwrap().as_str(),
            "https://plex.local:32400/library/sections"
        );
        assert_eq!(
            client.url_for(SERVER_IDENTITY_PATH).unwrap().as_str(),
            "https://plex.local:32400/"
        );
    }

    #[test]
    fn test_url_for_http() {
        let client = PlexClient::new(&config().with_https(false)).unwrap();
        assert_eq!(
            client.url_for(&section_items_path("3")).unwrap().as_str(),
            "http://plex.local:32400/library/sections/3/all"
        );
    }

    #[test]
    fn test_invalid_host() {
        let config = CollectionConfig::new("bad host", 32400, "secret");
        assert!(matches!(
            PlexClient::new(&config),
            Err(CollectorError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_token() {
        let config = CollectionConfig::new("plex.local", 32400, "line\nbreak");
        assert!(matches!(
            PlexClient::new(&config),
            Err(CollectorError::Config(_))
        ));
    }
}
