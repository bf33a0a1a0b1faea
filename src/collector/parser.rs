//! Plex response normalizer
//!
//! Plex has wrapped the same item lists in different envelopes across server
//! releases. [`Envelope::detect`] recognizes each of them once so the
//! counting code downstream only ever sees a flat list of items.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{CollectResult, CollectorError};

const LEGACY_CHILDREN: &str = "_children";
const CONTAINER: &str = "MediaContainer";
const METADATA: &str = "Metadata";
const DIRECTORY: &str = "Directory";
const FRIENDLY_NAME: &str = "friendlyName";

/// Known response envelopes, tried in this order
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Old servers: `{"_children": [...]}`
    Legacy(Vec<Value>),
    /// `{"MediaContainer": {"Metadata": [...]}}`
    Metadata(Vec<Value>),
    /// `{"MediaContainer": {"Directory": [...]}}`
    Directory(Vec<Value>),
}

impl Envelope {
    /// Detect the envelope of a decoded JSON response.
    ///
    /// Newer servers drop the item list entirely when a container is empty,
    /// so a `MediaContainer` reporting `size: 0` is read as an empty list.
    pub fn detect(path: &str, value: Value) -> CollectResult<Self> {
        let Value::Object(mut root) = value else {
            return Err(CollectorError::UnknownSchema(path.to_string()));
        };

        if let Some(Value::Array(items)) = root.remove(LEGACY_CHILDREN) {
            return Ok(Envelope::Legacy(items));
        }

        if let Some(Value::Object(mut container)) = root.remove(CONTAINER) {
            if let Some(Value::Array(items)) = container.remove(METADATA) {
                return Ok(Envelope::Metadata(items));
            }
            if let Some(Value::Array(items)) = container.remove(DIRECTORY) {
                return Ok(Envelope::Directory(items));
            }
            if container.get("size").and_then(Value::as_u64) == Some(0) {
                return Ok(Envelope::Metadata(Vec::new()));
            }
        }

        Err(CollectorError::UnknownSchema(path.to_string()))
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Legacy(_) => "legacy",
            Envelope::Metadata(_) => "metadata",
            Envelope::Directory(_) => "directory",
        }
    }

    pub fn items(&self) -> &[Value] {
        match self {
            Envelope::Legacy(items) | Envelope::Metadata(items) | Envelope::Directory(items) => {
                items
            }
        }
    }

    pub fn into_items(self) -> Vec<Value> {
        match self {
            Envelope::Legacy(items) | Envelope::Metadata(items) | Envelope::Directory(items) => {
                items
            }
        }
    }
}

/// Server display name: top-level `friendlyName`, else the wrapped one
pub fn parse_server_name(path: &str, value: &Value) -> CollectResult<String> {
    value
        .get(FRIENDLY_NAME)
        .or_else(|| value.get(CONTAINER).and_then(|c| c.get(FRIENDLY_NAME)))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CollectorError::UnknownSchema(path.to_string()))
}

/// Library section media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionKind {
    Movie,
    Show,
    Other(String),
}

impl From<&str> for SectionKind {
    fn from(s: &str) -> Self {
        match s {
            "movie" => SectionKind::Movie,
            "show" => SectionKind::Show,
            other => SectionKind::Other(other.to_string()),
        }
    }
}

/// A library section as listed by `/library/sections`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub key: String,
    pub title: String,
    pub kind: SectionKind,
}

impl Section {
    fn from_item(path: &str, item: &Value) -> CollectResult<Self> {
        let key = match item.get("key") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(CollectorError::MalformedItem {
                    context: path.to_string(),
                    field: "key",
                })
            }
        };

        let title = item
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let kind = item
            .get("type")
            .and_then(Value::as_str)
            .map(SectionKind::from)
            .unwrap_or_else(|| SectionKind::Other(String::new()));

        Ok(Self { key, title, kind })
    }
}

/// Normalize a section list response and key it by section ID
pub fn parse_sections(path: &str, value: Value) -> CollectResult<BTreeMap<String, Section>> {
    let envelope = Envelope::detect(path, value)?;
    tracing::debug!(path, envelope = envelope.kind(), "Detected response envelope");

    envelope
        .items()
        .iter()
        .map(|item| Section::from_item(path, item).map(|s| (s.key.clone(), s)))
        .collect()
}

/// One entry of `/status/sessions`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionItem {
    /// Element name, e.g. `Video` or `Track`
    pub kind: String,
    /// Playback state reported by the player, if any
    pub state: Option<String>,
}

/// Parse the XML session list.
///
/// Every direct child of `<MediaContainer>` is one session. Its state comes
/// from the nested `<Player state="...">`, falling back to a `state`
/// attribute on the item itself.
pub fn parse_sessions_xml(path: &str, body: &str) -> CollectResult<Vec<SessionItem>> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut saw_container = false;
    let mut sessions: Vec<SessionItem> = Vec::new();

    loop {
        let (element, opens) = match reader.read_event() {
            Ok(Event::Start(e)) => (e, true),
            Ok(Event::Empty(e)) => (e, false),
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                continue;
            }
            Ok(Event::Eof) => break,
            Ok(_) => continue,
            Err(e) => return Err(CollectorError::parse(path, "xml", e)),
        };

        let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
        match depth {
            0 if name == CONTAINER => saw_container = true,
            0 => return Err(CollectorError::UnknownSchema(path.to_string())),
            1 => sessions.push(SessionItem {
                kind: name,
                state: state_attribute(path, &element)?,
            }),
            _ if name == "Player" => {
                if let (Some(state), Some(current)) =
                    (state_attribute(path, &element)?, sessions.last_mut())
                {
                    current.state = Some(state);
                }
            }
            _ => {}
        }

        if opens {
            depth += 1;
        }
    }

    if !saw_container {
        return Err(CollectorError::UnknownSchema(path.to_string()));
    }

    Ok(sessions)
}

fn state_attribute(path: &str, element: &BytesStart<'_>) -> CollectResult<Option<String>> {
    let attr = element
        .try_get_attribute("state")
        .map_err(|e| CollectorError::parse(path, "xml", e))?;

    attr.map(|a| {
        a.unescape_value()
            .map(|v| v.into_owned())
            .map_err(|e| CollectorError::parse(path, "xml", e))
    })
    .transpose()
}

/// Remote access mapping as reported by `/myplex/account`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMapping {
    pub mapping_state: String,
    /// Absent when the server reports no mapping problem
    pub mapping_error: Option<String>,
}

/// Extract the `MyPlex` mapping fields
pub fn parse_remote_mapping(value: &Value) -> CollectResult<RemoteMapping> {
    let myplex: &Map<String, Value> = value
        .get("MyPlex")
        .and_then(Value::as_object)
        .ok_or(CollectorError::MissingField("MyPlex"))?;

    let mapping_state = myplex
        .get("mappingState")
        .and_then(Value::as_str)
        .ok_or(CollectorError::MissingField("mappingState"))?
        .to_string();
    let mapping_error = myplex
        .get("mappingError")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(RemoteMapping {
        mapping_state,
        mapping_error,
    })
}
