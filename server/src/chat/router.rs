//! Message routing: public broadcasts, direct (per-username) delivery, and
//! typing indicators.

use chrono::Utc;
use serde_json::Value;

use crate::error::HubError;
use crate::events::{
    clean_field, BroadcastMessage, ChatResponse, DeliveryAck, DirectMessageRequest,
    MessageReceived, TypingEvent, TypingRequest,
};
use crate::presence::lifecycle::auth_error;
use crate::state::AppState;
use crate::ws::broadcast::{broadcast_to_all, broadcast_to_others, send_to_connection};
use crate::ws::protocol::{envelope, send_event, send_error};
use crate::ws::ConnectionSender;

/// Handle a `message` event: any connection, authenticated or not, may
/// broadcast an arbitrary payload. The router enriches it with the sender's
/// connection id and a timestamp, appends it to the history buffer, fans it
/// out to everyone, and acknowledges the sender individually.
pub fn broadcast_message(
    state: &AppState,
    connection_id: &str,
    request_id: &str,
    tx: &ConnectionSender,
    payload: Value,
) {
    if payload.is_null() {
        send_error(tx, request_id, "message payload must not be null");
        return;
    }

    let entry = BroadcastMessage {
        from: connection_id.to_string(),
        message: payload,
        timestamp: Utc::now(),
    };

    let mut hub = state.lock_hub();
    hub.history.push(entry.clone());
    broadcast_to_all(&state.connections, &envelope("newMessage", "", &entry));
    send_event(
        tx,
        "messageReceived",
        request_id,
        &MessageReceived {
            status: "ok",
            message: entry.message,
            timestamp: entry.timestamp,
        },
    );
}

/// Handle a `chatMessage` event: deliver a validated text to every session of
/// one username. Failures (not logged in, bad text, unknown target) come back
/// on the acknowledgement channel as `{success:false, error}` and leave all
/// state untouched.
pub fn direct_message(
    state: &AppState,
    connection_id: &str,
    request_id: &str,
    tx: &ConnectionSender,
    req: &DirectMessageRequest,
) {
    let hub = state.lock_hub();

    let Some(sender_username) = hub.username_of(connection_id).cloned() else {
        fail_ack(tx, request_id, HubError::AuthenticationRequired);
        return;
    };

    let Some(message) = clean_field(&req.message) else {
        fail_ack(tx, request_id, HubError::InvalidField { field: "message" });
        return;
    };

    let target = req.person.trim();
    let Some(recipients) = hub.registry.connection_ids(target) else {
        fail_ack(tx, request_id, HubError::TargetNotFound(target.to_string()));
        return;
    };

    let timestamp = Utc::now();
    let outbound = envelope(
        "chatResponse",
        "",
        &ChatResponse {
            from: sender_username.clone(),
            message: message.clone(),
            timestamp,
            kind: "direct",
        },
    );
    for recipient in &recipients {
        send_to_connection(&state.connections, recipient, &outbound);
    }

    // Local confirmation for the sender's own UI.
    send_event(
        tx,
        "chatResponse",
        "",
        &ChatResponse {
            from: sender_username.clone(),
            message,
            timestamp,
            kind: "self",
        },
    );
    send_event(
        tx,
        "chatAck",
        request_id,
        &DeliveryAck {
            success: true,
            error: None,
            timestamp: Some(timestamp),
        },
    );

    tracing::debug!(
        from = %sender_username,
        to = %target,
        recipients = recipients.len(),
        "direct message delivered"
    );
}

/// Handle a `typing` event: authenticated connections only. The `person`
/// field is rewritten to the sender's own username — a client-supplied
/// identity is never trusted here — and the indicator goes to everyone else.
pub fn typing(state: &AppState, connection_id: &str, tx: &ConnectionSender, req: &TypingRequest) {
    let hub = state.lock_hub();

    let Some(username) = hub.username_of(connection_id) else {
        auth_error(tx);
        return;
    };

    let event = envelope(
        "typing",
        "",
        &TypingEvent {
            person: username.clone(),
            typing: req.typing,
            timestamp: Utc::now(),
        },
    );
    broadcast_to_others(&state.connections, connection_id, &event);
}

fn fail_ack(tx: &ConnectionSender, request_id: &str, err: HubError) {
    send_event(
        tx,
        "chatAck",
        request_id,
        &DeliveryAck {
            success: false,
            error: Some(err.to_string()),
            timestamp: None,
        },
    );
}
