//! Metric extraction
//!
//! Turns normalized Plex responses into gauge values. Every upstream entity
//! collapses into a [`Metric`] before it reaches a sink.
//!
//! # Metrics
//!
//! - `movies-<section>` - Number of movies in a movie section
//! - `shows-<section>` - Number of shows in a show section
//! - `episodes-<section>` - Sum of episode counts in a show section
//! - `sessions-total`, `sessions-active`, `sessions-inactive` - Current sessions
//! - `remote-reachability` - Remote access state (see [`ReachabilityStatus`])

use serde_json::Value;
use std::fmt;

use crate::collector::{RemoteMapping, SessionItem};
use crate::error::{CollectResult, CollectorError};

const LEAF_COUNT: &str = "leafCount";
const PLAYING: &str = "playing";

/// Media categories counted per library section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Movies,
    Shows,
    Episodes,
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaCategory::Movies => write!(f, "movies"),
            MediaCategory::Shows => write!(f, "shows"),
            MediaCategory::Episodes => write!(f, "episodes"),
        }
    }
}

/// Count of one category in one section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCountResult {
    pub section: String,
    pub category: MediaCategory,
    pub count: u64,
}

impl From<MediaCountResult> for Metric {
    fn from(result: MediaCountResult) -> Self {
        Metric::new(
            format!("{}-{}", result.category, result.section),
            result.count as f64,
        )
    }
}

/// A single gauge ready for dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// Instance name, unique within one collection run
    pub type_instance: String,
    pub value: f64,
}

impl Metric {
    pub fn new(type_instance: impl Into<String>, value: f64) -> Self {
        Self {
            type_instance: type_instance.into(),
            value,
        }
    }
}

/// Number of top-level items in a section
pub fn count_movies(items: &[Value]) -> u64 {
    items.len() as u64
}

/// Number of shows, or with `want_leaf_sum` the total of their episodes.
///
/// An item without a numeric `leafCount` is rejected rather than counted as
/// zero, and so is a sum that does not fit in a `u64`.
pub fn count_shows_or_episodes(
    context: &str,
    items: &[Value],
    want_leaf_sum: bool,
) -> CollectResult<u64> {
    if !want_leaf_sum {
        return Ok(items.len() as u64);
    }

    items.iter().try_fold(0u64, |total, item| {
        let n = item
            .get(LEAF_COUNT)
            .and_then(leaf_count)
            .ok_or_else(|| CollectorError::MalformedItem {
                context: context.to_string(),
                field: LEAF_COUNT,
            })?;
        total
            .checked_add(n)
            .ok_or_else(|| CollectorError::CountOverflow {
                context: context.to_string(),
            })
    })
}

// Some servers serialize counts as strings.
fn leaf_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Session counts for one poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
}

impl SessionSummary {
    pub fn metrics(&self) -> [Metric; 3] {
        [
            Metric::new("sessions-total", self.total as f64),
            Metric::new("sessions-active", self.active as f64),
            Metric::new("sessions-inactive", self.inactive as f64),
        ]
    }
}

/// Playing sessions are active, everything else (including sessions with no
/// reported state) is inactive.
pub fn count_sessions(sessions: &[SessionItem]) -> SessionSummary {
    let active = sessions
        .iter()
        .filter(|s| s.state.as_deref() == Some(PLAYING))
        .count() as u64;
    let total = sessions.len() as u64;

    SessionSummary {
        total,
        active,
        inactive: total - active,
    }
}

/// Remote access state of the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReachabilityStatus {
    Unreachable,
    Connecting,
    Reachable,
    Unknown,
}

impl ReachabilityStatus {
    /// Gauge value reported for this state
    pub fn value(self) -> i8 {
        match self {
            ReachabilityStatus::Unreachable => 0,
            ReachabilityStatus::Connecting => 1,
            ReachabilityStatus::Reachable => 2,
            ReachabilityStatus::Unknown => -1,
        }
    }

    pub fn metric(self) -> Metric {
        Metric::new("remote-reachability", f64::from(self.value()))
    }
}

/// Map the remote access mapping state onto a reachability status
pub fn reachability(mapping: &RemoteMapping) -> ReachabilityStatus {
    match mapping.mapping_state.as_str() {
        "mapped" if mapping.mapping_error.as_deref() == Some("unreachable") => {
            ReachabilityStatus::Unreachable
        }
        "mapped" => ReachabilityStatus::Reachable,
        "waiting" => ReachabilityStatus::Connecting,
        "unknown" => ReachabilityStatus::Unreachable,
        _ => ReachabilityStatus::Unknown,
    }
}
