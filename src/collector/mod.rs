//! Plex metric collection
//!
//! One collection run fetches the server name, then library counts, sessions
//! and remote reachability as configured, strictly one request at a time.
//!
//! # Example
//!
//! ```ignore
//! use plex_metrics::collector::Collector;
//! use plex_metrics::config::CollectionConfig;
//!
//! let collector = Collector::new(config)?;
//! let collection = collector.collect().await?;
//! ```

mod client;
mod filter;
mod parser;

pub use client::{
    section_items_path, PlexClient, RawResponse, ResponseFormat, LIBRARY_SECTIONS_PATH,
    MYPLEX_ACCOUNT_PATH, SERVER_IDENTITY_PATH, SESSIONS_PATH,
};
pub use filter::filter_sections;
pub use parser::{
    parse_remote_mapping, parse_server_name, parse_sections, parse_sessions_xml, Envelope,
    RemoteMapping, Section, SectionKind, SessionItem,
};

use tracing::{debug, info, instrument, warn};

use crate::config::CollectionConfig;
use crate::error::{CollectResult, CollectorError};
use crate::metrics::{
    count_movies, count_sessions, count_shows_or_episodes, reachability, MediaCategory,
    MediaCountResult, Metric, SessionSummary,
};
use crate::sink::MetricSink;

/// Result of one collection run
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    /// Server display name, used as the plugin instance
    pub server_name: String,
    pub metrics: Vec<Metric>,
}

impl Collection {
    /// Forward every metric to `sink`
    pub fn dispatch<S: MetricSink + ?Sized>(&self, sink: &mut S) -> CollectResult<usize> {
        for metric in &self.metrics {
            sink.emit(&metric.type_instance, &self.server_name, metric.value)?;
        }
        sink.flush()?;
        Ok(self.metrics.len())
    }
}

/// Runs the collection pipeline for one configuration
pub struct Collector {
    client: PlexClient,
    config: CollectionConfig,
}

impl Collector {
    /// Validate `config` and build the HTTP client
    pub fn new(config: CollectionConfig) -> CollectResult<Self> {
        config.validate()?;
        let client = PlexClient::new(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Run the pipeline and return the collected metrics
    #[instrument(skip(self), fields(host = %self.config.host, port = self.config.port))]
    pub async fn collect(&self) -> CollectResult<Collection> {
        let config = &self.config;
        config.validate()?;

        let server_name = self.server_name().await?;
        debug!(server = %server_name, "Resolved server name");

        let mut metrics = Vec::new();

        if config.categories.wants_media() {
            metrics.extend(self.media_metrics().await?.into_iter().map(Metric::from));
        }

        if config.categories.sessions {
            metrics.extend(self.session_summary().await?.metrics());
        }

        if config.categories.myplex_reachability {
            match self.remote_reachability().await {
                Ok(metric) => metrics.push(metric),
                Err(CollectorError::MissingField(field)) if config.categories.only_reachability() => {
                    warn!(field, "Remote access state unavailable, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        if metrics.is_empty() {
            return Err(CollectorError::NoMetrics);
        }

        info!(server = %server_name, count = metrics.len(), "Collected metrics");

        Ok(Collection {
            server_name,
            metrics,
        })
    }

    /// Collect, then dispatch every metric to `sink`
    pub async fn run<S: MetricSink + ?Sized>(&self, sink: &mut S) -> CollectResult<usize> {
        self.collect().await?.dispatch(sink)
    }

    async fn server_name(&self) -> CollectResult<String> {
        let identity = self.client.server_identity().await?;
        parse_server_name(SERVER_IDENTITY_PATH, &identity)
    }

    async fn media_metrics(&self) -> CollectResult<Vec<MediaCountResult>> {
        let categories = self.config.categories;
        let sections = parse_sections(
            LIBRARY_SECTIONS_PATH,
            self.client.library_sections().await?,
        )?;
        let keys = filter_sections(&sections, &self.config.include, &self.config.exclude);

        let mut results = Vec::new();
        for key in keys {
            let Some(section) = sections.get(&key) else {
                continue;
            };

            let wanted = match section.kind {
                SectionKind::Movie => categories.movies,
                SectionKind::Show => categories.shows || categories.episodes,
                SectionKind::Other(_) => false,
            };
            if !wanted {
                debug!(section = %key, kind = ?section.kind, "Skipping section");
                continue;
            }

            let path = section_items_path(&key);
            let items = Envelope::detect(&path, self.client.section_items(&key).await?)?.into_items();

            match section.kind {
                SectionKind::Movie => results.push(MediaCountResult {
                    section: key.clone(),
                    category: MediaCategory::Movies,
                    count: count_movies(&items),
                }),
                SectionKind::Show => {
                    if categories.shows {
                        results.push(MediaCountResult {
                            section: key.clone(),
                            category: MediaCategory::Shows,
                            count: count_shows_or_episodes(&path, &items, false)?,
                        });
                    }
                    if categories.episodes {
                        results.push(MediaCountResult {
                            section: key.clone(),
                            category: MediaCategory::Episodes,
                            count: count_shows_or_episodes(&path, &items, true)?,
                        });
                    }
                }
                SectionKind::Other(_) => {}
            }

            debug!(section = %key, title = %section.title, items = items.len(), "Counted section");
        }

        Ok(results)
    }

    async fn session_summary(&self) -> CollectResult<SessionSummary> {
        let body = self.client.sessions().await?;
        let sessions = parse_sessions_xml(SESSIONS_PATH, &body)?;
        Ok(count_sessions(&sessions))
    }

    async fn remote_reachability(&self) -> CollectResult<Metric> {
        let account = self.client.myplex_account().await?;
        let mapping = parse_remote_mapping(&account)?;
        let status = reachability(&mapping);
        debug!(
            state = %mapping.mapping_state,
            error = ?mapping.mapping_error,
            status = ?status,
            "Resolved remote reachability"
        );
        Ok(status.metric())
    }
}
