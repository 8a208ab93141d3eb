//! WebSocket relay events.
//!
//! Frames are JSON objects of the form `{"event": "...", "data": ...}`.
//!
//! ```json
//! {"event": "join-room", "data": "5f0c..."}
//! {"event": "send-message", "data": {"receiverId": "5f0c...", "text": "hi"}}
//! {"event": "receive-message", "data": {"receiverId": "5f0c...", "text": "hi"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames accepted from clients.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Subscribe this connection to the room named by the user id.
    JoinRoom(String),
    /// Relay the payload to the room named by its `receiverId`.
    SendMessage(Value),
}

/// Frames pushed to clients.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    ReceiveMessage(Value),
}

/// Room a `send-message` payload is addressed to.
///
/// Accepts a string or a number; anything else is unroutable.
pub fn receiver_room(payload: &Value) -> Option<String> {
    match payload.get("receiverId")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
