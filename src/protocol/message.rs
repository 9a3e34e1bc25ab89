//! Notification message envelope.
//!
//! Every frame exchanged with the dashboard's `/ws` endpoint carries one
//! envelope:
//!
//! ```json
//! {
//!   "type": "server-status",
//!   "server_id": "srv-1",
//!   "data": { ... },
//!   "timestamp": "2024-01-01T00:00:00Z"
//! }
//! ```
//!
//! The server may coalesce several queued envelopes into one text frame,
//! separated by `\n`; see [`Message::parse_frame`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Message
// ============================================================================

/// A notification envelope.
///
/// Fields are read-only once constructed. Listeners receive `&Message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message type tag.
    #[serde(rename = "type")]
    message_type: String,

    /// Scope the message belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    server_id: Option<String>,

    /// Arbitrary payload.
    #[serde(default)]
    data: Value,

    /// Time the message was produced, as sent on the wire.
    #[serde(default)]
    timestamp: String,
}

impl Message {
    /// Creates a message stamped with the current UTC time.
    #[must_use]
    pub fn new(message_type: impl Into<String>, data: Value) -> Self {
        Self {
            message_type: message_type.into(),
            server_id: None,
            data,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Creates a heartbeat message (`"type": "ping"`).
    #[inline]
    #[must_use]
    pub fn ping() -> Self {
        Self::new(MessageKind::Ping.as_str(), Value::Null)
    }

    /// Scopes the message to a server.
    #[inline]
    #[must_use]
    pub fn with_server_id(mut self, server_id: impl Into<String>) -> Self {
        self.server_id = Some(server_id.into());
        self
    }

    /// Returns the raw type tag.
    #[inline]
    #[must_use]
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// Returns the classified message kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        MessageKind::from_type(&self.message_type)
    }

    /// Returns the scope identifier.
    ///
    /// The server serializes an unscoped message with `"server_id": ""`,
    /// which is reported as `None`.
    #[inline]
    #[must_use]
    pub fn server_id(&self) -> Option<&str> {
        self.server_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Returns the payload.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Returns the timestamp exactly as received.
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Parses the timestamp as RFC 3339.
    #[must_use]
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }

    /// Parses one inbound text frame.
    ///
    /// A frame normally holds a single envelope. When it does not parse as
    /// one and contains newlines, each non-blank line is parsed on its own,
    /// so one malformed line does not cost the others.
    #[must_use]
    pub fn parse_frame(text: &str) -> Vec<serde_json::Result<Message>> {
        let text = text.trim();

        match serde_json::from_str::<Message>(text) {
            Ok(message) => vec![Ok(message)],
            Err(_) if text.contains('\n') => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(serde_json::from_str::<Message>)
                .collect(),
            Err(e) => vec![Err(e)],
        }
    }
}

// ============================================================================
// MessageKind
// ============================================================================

/// Known message type tags emitted by the dashboard server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Connection-level notices (`"system"`).
    System,
    /// Media server status change (`"server-status"`).
    ServerStatus,
    /// Device list change (`"device-update"`).
    DeviceUpdate,
    /// Library change (`"library-update"`).
    LibraryUpdate,
    /// Heartbeat request (`"ping"`).
    Ping,
    /// Heartbeat reply (`"pong"`).
    Pong,
    /// Any other tag; inspect [`Message::message_type`].
    Unknown,
}

impl MessageKind {
    /// Classifies a raw type tag.
    #[must_use]
    pub fn from_type(message_type: &str) -> Self {
        match message_type {
            "system" => Self::System,
            "server-status" => Self::ServerStatus,
            "device-update" => Self::DeviceUpdate,
            "library-update" => Self::LibraryUpdate,
            "ping" => Self::Ping,
            "pong" => Self::Pong,
            _ => Self::Unknown,
        }
    }

    /// Returns the wire tag, or `""` for [`MessageKind::Unknown`].
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::ServerStatus => "server-status",
            Self::DeviceUpdate => "device-update",
            Self::LibraryUpdate => "library-update",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Unknown => "",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            other => f.write_str(other.as_str()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_parse_sync_message() {
        let frame = r#"{"type":"sync","data":{"ok":true},"timestamp":"2024-01-01T00:00:00Z"}"#;

        let parsed = Message::parse_frame(frame);
        assert_eq!(parsed.len(), 1);

        let message = parsed.into_iter().next().unwrap().expect("valid message");
        assert_eq!(message.message_type(), "sync");
        assert_eq!(message.server_id(), None);
        assert_eq!(message.data(), &json!({ "ok": true }));
        assert_eq!(message.timestamp(), "2024-01-01T00:00:00Z");
        assert_eq!(message.kind(), MessageKind::Unknown);
    }

    #[test]
    fn test_parse_server_scoped_message() {
        let frame = r#"{
            "type": "server-status",
            "server_id": "srv-1",
            "data": { "online": true },
            "timestamp": "2024-05-01T12:30:00.123456789+08:00"
        }"#;

        let message = Message::parse_frame(frame).remove(0).expect("valid message");
        assert_eq!(message.kind(), MessageKind::ServerStatus);
        assert_eq!(message.server_id(), Some("srv-1"));

        let ts = message.parsed_timestamp().expect("rfc3339 timestamp");
        assert_eq!(ts.to_rfc3339_opts(SecondsFormat::Secs, true), "2024-05-01T04:30:00Z");
    }

    #[test]
    fn test_empty_server_id_is_unscoped() {
        let frame = r#"{"type":"system","server_id":"","data":null,"timestamp":""}"#;
        let message = Message::parse_frame(frame).remove(0).expect("valid message");
        assert_eq!(message.server_id(), None);
        assert_eq!(message.parsed_timestamp(), None);
    }

    #[test]
    fn test_parse_malformed_frame() {
        let parsed = Message::parse_frame("not json at all");
        assert_eq!(parsed.len(), 1);
        assert!(parsed[0].is_err());
    }

    #[test]
    fn test_parse_missing_type_is_error() {
        let parsed = Message::parse_frame(r#"{"data":{},"timestamp":"x"}"#);
        assert!(parsed[0].is_err());
    }

    #[test]
    fn test_parse_batched_frame() {
        let frame = concat!(
            r#"{"type":"device-update","server_id":"a","data":[],"timestamp":"t1"}"#,
            "\n",
            "{broken",
            "\n",
            r#"{"type":"library-update","server_id":"a","data":[],"timestamp":"t2"}"#,
            "\n"
        );

        let parsed = Message::parse_frame(frame);
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].as_ref().unwrap().kind(), MessageKind::DeviceUpdate);
        assert!(parsed[1].is_err());
        assert_eq!(parsed[2].as_ref().unwrap().kind(), MessageKind::LibraryUpdate);
    }

    #[test]
    fn test_pretty_printed_single_message_is_not_split() {
        let frame = "{\n  \"type\": \"pong\",\n  \"data\": null,\n  \"timestamp\": \"t\"\n}";
        let parsed = Message::parse_frame(frame);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].as_ref().unwrap().kind(), MessageKind::Pong);
    }

    #[test]
    fn test_new_message_serialization() {
        let message = Message::new("subscribe", json!({ "topic": "devices" })).with_server_id("srv-9");
        let value = serde_json::to_value(&message).expect("serialize");

        assert_eq!(value["type"], "subscribe");
        assert_eq!(value["server_id"], "srv-9");
        assert_eq!(value["data"]["topic"], "devices");
        assert!(message.parsed_timestamp().is_some());
    }

    #[test]
    fn test_ping_omits_server_id() {
        let json = serde_json::to_string(&Message::ping()).expect("serialize");
        assert!(json.contains(r#""type":"ping""#));
        assert!(!json.contains("server_id"));
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            MessageKind::System,
            MessageKind::ServerStatus,
            MessageKind::DeviceUpdate,
            MessageKind::LibraryUpdate,
            MessageKind::Ping,
            MessageKind::Pong,
        ] {
            assert_eq!(MessageKind::from_type(kind.as_str()), kind);
        }
        assert_eq!(MessageKind::Unknown.to_string(), "unknown");
    }
}
