//! Live channel message types
//!
//! These types are used for:
//! - Messages pushed by the backend on the `/topic/*` destinations
//! - Commands sent to the backend on `/app/command`
//! - The fallback polling response, which shares the stats payload shape

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Topic carrying periodic collector statistics
pub const TOPIC_STATS: &str = "/topic/stats";

/// Topic carrying service dependency (topology) snapshots
pub const TOPIC_TOPOLOGY: &str = "/topic/topology";

/// Topic carrying recent trace spans
pub const TOPIC_TRACES: &str = "/topic/traces";

/// Topic carrying error alerts
pub const TOPIC_ALERTS: &str = "/topic/alerts";

/// Destination accepting client commands
pub const COMMAND_DESTINATION: &str = "/app/command";

/// Opaque JSON payload as produced by the backend
pub type Payload = serde_json::Value;

/// Kind of a pushed message, carried in the `type` discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    /// Aggregate collector statistics
    StatsUpdate,
    /// Service dependency graph
    TopologyUpdate,
    /// Recent trace spans
    TracesUpdate,
    /// A service reported an error
    ErrorAlert,
}

impl MessageKind {
    /// All message kinds with the topic each one is published on
    pub const ROUTES: [(MessageKind, &'static str); 4] = [
        (MessageKind::StatsUpdate, TOPIC_STATS),
        (MessageKind::TopologyUpdate, TOPIC_TOPOLOGY),
        (MessageKind::TracesUpdate, TOPIC_TRACES),
        (MessageKind::ErrorAlert, TOPIC_ALERTS),
    ];

    /// Topic this kind of message is published on
    pub fn topic(self) -> &'static str {
        match self {
            MessageKind::StatsUpdate => TOPIC_STATS,
            MessageKind::TopologyUpdate => TOPIC_TOPOLOGY,
            MessageKind::TracesUpdate => TOPIC_TRACES,
            MessageKind::ErrorAlert => TOPIC_ALERTS,
        }
    }

    /// Wire name of the discriminator
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::StatsUpdate => "STATS_UPDATE",
            MessageKind::TopologyUpdate => "TOPOLOGY_UPDATE",
            MessageKind::TracesUpdate => "TRACES_UPDATE",
            MessageKind::ErrorAlert => "ERROR_ALERT",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope of every message pushed on the live channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message discriminator
    #[serde(rename = "type")]
    pub kind: MessageKind,

    /// Message body, interpreted according to `kind`
    #[serde(default)]
    pub data: Payload,

    /// Server timestamp, when the backend sets one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Free-form annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Message {
    /// Create a message with the given kind and payload
    pub fn new(kind: MessageKind, data: Payload) -> Self {
        Self {
            kind,
            data,
            timestamp: None,
            message: None,
        }
    }

    /// Wrap a polled stats response so it can be dispatched like a pushed one
    pub fn stats(data: Payload) -> Self {
        Self::new(MessageKind::StatsUpdate, data)
    }

    /// Parse a message body received on the live channel
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// Payload of `STATS_UPDATE` messages and of `GET /api/realtime-stats`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsPayload {
    /// Collector counters shown on the dashboard cards
    #[serde(default)]
    pub collector_stats: Option<CollectorStats>,

    /// Per-service statistics
    #[serde(default)]
    pub service_stats: Option<Payload>,

    /// Error analysis for the last hour
    #[serde(default)]
    pub error_analysis: Option<Payload>,

    #[serde(default)]
    pub timestamp: Option<Payload>,

    #[serde(default)]
    pub cache_size: Option<Payload>,
}

/// Collector counters
///
/// Numbers stay as JSON numbers so they render exactly as the backend sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorStats {
    #[serde(default)]
    pub total_received_requests: Option<serde_json::Number>,

    #[serde(default)]
    pub total_received_spans: Option<serde_json::Number>,

    /// Percentage of successfully processed reports
    #[serde(default)]
    pub success_rate: Option<f64>,

    #[serde(default)]
    pub running_hours: Option<serde_json::Number>,
}

/// Payload of `ERROR_ALERT` messages
///
/// The backend builds alerts from loosely typed maps, so every field is
/// optional and [`ErrorAlert::from_payload`] never fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorAlert {
    /// Service that raised the error
    #[serde(default)]
    pub service_name: Option<String>,

    /// Error description
    #[serde(default)]
    pub error_message: Option<String>,

    /// Alert level; `critical` is escalated
    #[serde(default)]
    pub level: Option<String>,

    /// When the backend raised the alert: RFC 3339, local ISO-8601 or epoch millis
    #[serde(default)]
    pub timestamp: Option<Payload>,
}

/// Shown in place of a missing alert field
const MISSING_FIELD: &str = "unknown";

impl ErrorAlert {
    /// Read an alert from an arbitrary payload
    ///
    /// Missing or `null` fields stay `None`; non-string values are kept as
    /// their JSON text.
    pub fn from_payload(data: &Payload) -> Self {
        let text = |name: &str| match data.get(name) {
            None | Some(Payload::Null) => None,
            Some(Payload::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };

        Self {
            service_name: text("serviceName"),
            error_message: text("errorMessage"),
            level: text("level"),
            timestamp: data.get("timestamp").filter(|ts| !ts.is_null()).cloned(),
        }
    }

    /// Whether the alert is at the `critical` level
    pub fn is_critical(&self) -> bool {
        self.level
            .as_deref()
            .is_some_and(|level| level.eq_ignore_ascii_case("critical"))
    }

    /// Text shown to the user for this alert
    pub fn summary(&self) -> String {
        format!(
            "[{}] {}",
            self.service_name.as_deref().unwrap_or(MISSING_FIELD),
            self.error_message.as_deref().unwrap_or(MISSING_FIELD)
        )
    }

    /// Alert time, if the backend sent one we can read
    pub fn raised_at(&self) -> Option<DateTime<Utc>> {
        match self.timestamp.as_ref()? {
            Payload::Number(ms) => ms.as_i64().and_then(DateTime::from_timestamp_millis),
            Payload::String(ts) => DateTime::parse_from_rfc3339(ts)
                .map(|ts| ts.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|ts| ts.and_utc())
                }),
            _ => None,
        }
    }
}

/// Commands accepted on [`COMMAND_DESTINATION`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Ask the backend to drop its caches and push fresh data
    Refresh,
}

impl Command {
    /// JSON body for the command frame
    pub fn to_json(&self) -> String {
        match self {
            Command::Refresh => r#"{"type":"REFRESH"}"#.to_string(),
        }
    }
}
