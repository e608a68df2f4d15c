use serde::{Deserialize, Serialize};
use serde_json::json;

/// Event name emitted after a public contact form is persisted.
pub const NEW_CONTACT_SUBMISSION: &str = "new_contact_submission";

/// Transient server-side event, serialised on the wire as `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
}

impl NotificationEvent {
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }

    pub fn from_payload<T: Serialize>(
        event_type: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(event_type, serde_json::to_value(payload)?))
    }
}

/// Frames pushed from the server to a connected admin session.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Connected { message: String },
    Event(NotificationEvent),
    Pong,
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        match self {
            ServerMessage::Connected { message } => {
                serde_json::to_string(&json!({ "type": "connected", "message": message }))
            }
            ServerMessage::Event(event) => serde_json::to_string(event),
            ServerMessage::Pong => serde_json::to_string(&json!({ "type": "pong" })),
        }
    }
}

impl From<NotificationEvent> for ServerMessage {
    fn from(event: NotificationEvent) -> Self {
        ServerMessage::Event(event)
    }
}

/// The only client frame the server acts on; anything else is logged and dropped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
}

impl ClientMessage {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
