//! Wire-level event envelopes and payload types.
//! Every frame is a JSON envelope `{event, requestId, data}`; responses echo
//! the requestId so callers can correlate acknowledgements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum length (chars, after trimming) for usernames, display names,
/// and direct-message text.
pub const MAX_FIELD_CHARS: usize = 100;

/// Trim and validate a client-supplied text field.
/// Returns `None` when the trimmed value is empty or over the length limit.
pub fn clean_field(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_FIELD_CHARS {
        return None;
    }
    Some(trimmed.to_string())
}

/// Inbound envelope. `request_id` and `data` are optional on the wire;
/// missing values default to empty/null.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub data: Value,
}

// --- Inbound payloads ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub client_agent: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingRequest {
    /// Client-supplied identity; ignored and rewritten server-side.
    #[serde(default)]
    pub person: String,
    #[serde(default)]
    pub typing: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessageRequest {
    /// Destination username.
    pub person: String,
    pub message: String,
}

// --- Outbound payloads ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connected {
    pub connection_id: String,
    pub server_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSuccess {
    pub username: String,
    pub session_id: String,
}

/// Generic error body, also used for `loginError`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
}

/// A broadcast message enriched with its sender and receive time.
/// Stored in the history buffer and fanned out as `newMessage`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastMessage {
    pub from: String,
    pub message: Value,
    pub timestamp: DateTime<Utc>,
}

/// Per-sender acknowledgement for a `message` event.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReceived {
    pub status: &'static str,
    pub message: Value,
    pub timestamp: DateTime<Utc>,
}

/// Direct chat payload delivered to the target's sessions (`type: "direct"`)
/// and echoed back to the sender (`type: "self"`).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub from: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Acknowledgement for a `chatMessage` event, correlated by requestId.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingEvent {
    pub person: String,
    pub typing: bool,
    pub timestamp: DateTime<Utc>,
}

/// One session's detail inside a roster entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub login_time: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub source_url: String,
    pub client_agent: String,
    pub online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// One username's entry in the published `userList`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub username: String,
    pub full_name: String,
    pub sessions: Vec<SessionInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMaintenance {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
