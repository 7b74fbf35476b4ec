//! Inbound frame handling: decode the JSON envelope, dispatch on the event
//! name, and send responses. Malformed frames and unknown events produce an
//! error envelope for the sender and nothing else.

use axum::extract::ws::Message;
use serde::Serialize;
use serde_json::json;

use crate::chat::router;
use crate::events::{DirectMessageRequest, Envelope, ErrorBody, LoginRequest, TypingRequest};
use crate::presence::lifecycle;
use crate::state::AppState;
use crate::ws::ConnectionSender;

/// Build an outbound `{event, requestId, data}` frame.
pub fn envelope(event: &str, request_id: &str, data: &impl Serialize) -> Message {
    let frame = json!({
        "event": event,
        "requestId": request_id,
        "data": data,
    });
    Message::Text(frame.to_string().into())
}

/// Send one event frame to a single connection.
pub fn send_event(tx: &ConnectionSender, event: &str, request_id: &str, data: &impl Serialize) {
    let _ = tx.send(envelope(event, request_id, data));
}

/// Send an `error` envelope to a single connection.
pub fn send_error(tx: &ConnectionSender, request_id: &str, message: &str) {
    send_event(
        tx,
        "error",
        request_id,
        &ErrorBody {
            message: message.to_string(),
        },
    );
}

/// Handle one incoming text frame: decode the envelope and dispatch.
pub fn handle_text_message(
    text: &str,
    tx: &ConnectionSender,
    state: &AppState,
    connection_id: &str,
) {
    let env: Envelope = match serde_json::from_str(text) {
        Ok(env) => env,
        Err(e) => {
            tracing::warn!(
                connection_id = %connection_id,
                error = %e,
                "failed to decode envelope"
            );
            send_error(tx, "", "invalid JSON envelope");
            return;
        }
    };

    match env.event.as_str() {
        "login" => match serde_json::from_value::<LoginRequest>(env.data) {
            Ok(req) => lifecycle::login(state, connection_id, &env.request_id, tx, &req),
            Err(_) => send_event(
                tx,
                "loginError",
                &env.request_id,
                &ErrorBody {
                    message: "malformed login payload".to_string(),
                },
            ),
        },
        "message" => {
            router::broadcast_message(state, connection_id, &env.request_id, tx, env.data);
        }
        "typing" => match serde_json::from_value::<TypingRequest>(env.data) {
            Ok(req) => router::typing(state, connection_id, tx, &req),
            Err(_) => send_error(tx, &env.request_id, "malformed typing payload"),
        },
        "chatMessage" => match serde_json::from_value::<DirectMessageRequest>(env.data) {
            Ok(req) => router::direct_message(state, connection_id, &env.request_id, tx, &req),
            Err(_) => send_error(tx, &env.request_id, "malformed chatMessage payload"),
        },
        "updateStatus" => match env.data.as_str() {
            Some(status) => lifecycle::update_status(state, connection_id, tx, status),
            None => send_error(tx, &env.request_id, "updateStatus payload must be a string"),
        },
        other => {
            tracing::debug!(
                connection_id = %connection_id,
                event = %other,
                "unhandled event"
            );
            send_error(tx, &env.request_id, &format!("unknown event: {other}"));
        }
    }
}
