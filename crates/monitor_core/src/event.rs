use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Closed set of event kinds the sidecar may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Stage,
    Progress,
    Warning,
    Error,
    Metric,
    Completed,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Stage,
        EventKind::Progress,
        EventKind::Warning,
        EventKind::Error,
        EventKind::Metric,
        EventKind::Completed,
    ];

    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == text)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Stage => "stage",
            EventKind::Progress => "progress",
            EventKind::Warning => "warning",
            EventKind::Error => "error",
            EventKind::Metric => "metric",
            EventKind::Completed => "completed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An accepted sidecar event. Fields are private so an event cannot change once built.
///
/// Serializes with the sidecar's own wire keys (`type`, `ts`, `fileId`) so an
/// exported log can be fed back through [`validate_envelope`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    kind: EventKind,
    stage: String,
    #[serde(rename = "ts")]
    timestamp: String,
    #[serde(rename = "fileId")]
    job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    percent: Option<f64>,
}

impl Event {
    pub fn new(
        kind: EventKind,
        stage: impl Into<String>,
        timestamp: impl Into<String>,
        job_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            stage: stage.into(),
            timestamp: timestamp.into(),
            job_id: job_id.into(),
            message: None,
            percent: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches a percent reading; values outside `[0, 100]` or non-finite are dropped.
    pub fn with_percent(mut self, percent: f64) -> Self {
        self.percent = usable_percent(percent);
        self
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Raw percent as reported, either a fraction or a whole percentage.
    pub fn percent(&self) -> Option<f64> {
        self.percent
    }
}

/// Why an envelope was dropped. Only used for diagnostics, never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("payload is not valid JSON: {0}")]
    MalformedJson(String),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` must be a string")]
    WrongType(&'static str),
    #[error("field `{0}` is given under both of its names")]
    DuplicateField(&'static str),
    #[error("unknown event kind {0:?}")]
    UnknownKind(String),
}

/// Parse one raw channel payload into an [`Event`].
///
/// Required keys are `kind`, `stage`, `timestamp` and `jobId` (the sidecar's
/// `type`, `ts` and `fileId` are accepted too). Optional fields of the wrong
/// type are treated as absent instead of failing the whole envelope.
pub fn validate_envelope(raw: &str) -> Result<Event, RejectReason> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|err| RejectReason::MalformedJson(err.to_string()))?;
    let Value::Object(mut object) = value else {
        return Err(RejectReason::NotAnObject);
    };

    let kind = required_text(&mut object, "kind", Some("type"))?;
    let stage = required_text(&mut object, "stage", None)?;
    let timestamp = required_text(&mut object, "timestamp", Some("ts"))?;
    let job_id = required_text(&mut object, "jobId", Some("fileId"))?;
    let kind = EventKind::parse(&kind).ok_or(RejectReason::UnknownKind(kind))?;

    Ok(Event {
        kind,
        stage,
        timestamp,
        job_id,
        message: match object.remove("message") {
            Some(Value::String(text)) => Some(text),
            _ => None,
        },
        // Overflowing literals such as 1e400 survive parsing as raw numbers
        // and are dropped here along with every other unusable value.
        percent: object
            .get("percent")
            .and_then(Value::as_f64)
            .and_then(usable_percent),
    })
}

fn required_text(
    object: &mut Map<String, Value>,
    name: &'static str,
    alias: Option<&'static str>,
) -> Result<String, RejectReason> {
    let canonical = object.remove(name);
    let aliased = alias.and_then(|alias| object.remove(alias));
    let value = match (canonical, aliased) {
        (Some(_), Some(_)) => return Err(RejectReason::DuplicateField(name)),
        (Some(value), None) | (None, Some(value)) => value,
        (None, None) => return Err(RejectReason::MissingField(name)),
    };
    match value {
        Value::String(text) => Ok(text),
        _ => Err(RejectReason::WrongType(name)),
    }
}

fn usable_percent(raw: f64) -> Option<f64> {
    (raw.is_finite() && (0.0..=100.0).contains(&raw)).then_some(raw)
}
