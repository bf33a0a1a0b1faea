//! Error types for plex-metrics
//!
//! Every error is fatal to a collection run. Nothing is retried and nothing
//! is downgraded to a default value.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for collection operations
pub type CollectResult<T> = Result<T, CollectorError>;

/// Errors raised while collecting metrics from a Plex Media Server
#[derive(Error, Debug)]
pub enum CollectorError {
    /// Missing or invalid parameter, or no metric category selected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failed to build the HTTP client
    #[error("Failed to initialize HTTP client: {0}")]
    ClientInit(#[source] reqwest::Error),

    /// Network or connection failure
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("HTTP error status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// The request did not complete in time.
    /// The value is the configured timeout in milliseconds, if known.
    #[error("Request timed out{}", .0.map(|ms| format!(" after {}ms", ms)).unwrap_or_default())]
    Timeout(Option<u64>),

    /// Response body could not be decoded in the requested format
    #[error("Failed to parse {format} response from {path}: {message}")]
    Parse {
        path: String,
        format: &'static str,
        message: String,
    },

    /// None of the known response envelopes matched
    #[error("Unrecognized response shape from {0}")]
    UnknownSchema(String),

    /// An item is missing a field the counting logic depends on
    #[error("Malformed item in {context}: missing '{field}'")]
    MalformedItem { context: String, field: &'static str },

    /// Summed episode counts do not fit in a gauge counter
    #[error("Episode count overflow in {context}")]
    CountOverflow { context: String },

    /// Remote account response lacks the mapping fields
    #[error("Missing field '{0}' in remote access response")]
    MissingField(&'static str),

    /// The pipeline finished without producing a single metric
    #[error("No metrics collected")]
    NoMetrics,

    /// Writing a metric to the sink failed
    #[error("Failed to write metric: {0}")]
    Output(#[from] std::io::Error),
}

impl CollectorError {
    /// Whether the error came from the network rather than the payload
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CollectorError::Transport { .. }
                | CollectorError::HttpStatus { .. }
                | CollectorError::Timeout(_)
        )
    }

    /// HTTP status code, if the server answered with one
    pub fn http_status(&self) -> Option<u16> {
        match self {
            CollectorError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Create a Timeout error with known duration
    pub fn timeout_with_duration(ms: u64) -> Self {
        CollectorError::Timeout(Some(ms))
    }

    pub(crate) fn parse(path: &str, format: &'static str, message: impl ToString) -> Self {
        CollectorError::Parse {
            path: path.to_string(),
            format,
            message: message.to_string(),
        }
    }
}
