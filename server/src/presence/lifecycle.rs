//! Session lifecycle: login, status updates, and disconnect.
//!
//! Each connection moves Connected -> Authenticated -> Disconnected. Login is
//! retryable until it succeeds; the username association is set once and kept
//! until the transport closes.

use crate::error::HubError;
use crate::events::{clean_field, ErrorBody, LoginRequest, LoginSuccess, MAX_FIELD_CHARS};
use crate::presence::registry::Session;
use crate::presence::roster;
use crate::state::AppState;
use crate::ws::protocol::send_event;
use crate::ws::ConnectionSender;

/// Handle a `login` event. Validates username and full name, registers the
/// session, fixes the connection's username association, acknowledges the
/// requester, and republishes the roster.
pub fn login(
    state: &AppState,
    connection_id: &str,
    request_id: &str,
    tx: &ConnectionSender,
    req: &LoginRequest,
) {
    let Some(username) = clean_field(&req.username) else {
        login_error(tx, request_id, HubError::InvalidField { field: "username" });
        return;
    };
    let Some(full_name) = clean_field(&req.full_name) else {
        login_error(tx, request_id, HubError::InvalidField { field: "fullName" });
        return;
    };

    let mut hub = state.lock_hub();

    // The association is immutable for the connection's lifetime.
    if let Some(existing) = hub.username_of(connection_id) {
        let message = format!("already logged in as {existing}");
        send_event(tx, "loginError", request_id, &ErrorBody { message });
        return;
    }

    let session = Session::new(connection_id, &full_name, &req.source_url, &req.client_agent);
    hub.registry.register(&username, session);
    hub.identities
        .insert(connection_id.to_string(), username.clone());

    tracing::info!(
        username = %username,
        connection_id = %connection_id,
        sessions = hub.registry.connection_ids(&username).map(|c| c.len()).unwrap_or(0),
        "login"
    );

    send_event(
        tx,
        "loginSuccess",
        request_id,
        &LoginSuccess {
            username: username.clone(),
            session_id: connection_id.to_string(),
        },
    );
    roster::publish(&hub.registry, &state.connections);
}

/// Handle an `updateStatus` event. Only meaningful once authenticated;
/// touches the caller's own session and republishes the roster. The event is
/// fire-and-forget, so an over-long status is truncated rather than rejected.
pub fn update_status(state: &AppState, connection_id: &str, tx: &ConnectionSender, status: &str) {
    let mut hub = state.lock_hub();

    if hub.username_of(connection_id).is_none() {
        auth_error(tx);
        return;
    }

    let status: String = status.trim().chars().take(MAX_FIELD_CHARS).collect();
    hub.registry.touch(connection_id, Some(status));
    roster::publish(&hub.registry, &state.connections);
}

/// Handle transport closure. Runs for every connection regardless of state;
/// an unauthenticated connection has no registry effect. For authenticated
/// ones: mark the session offline, then drop it — pruning the one session if
/// the username keeps other live sessions, evicting the username otherwise.
pub fn disconnect(state: &AppState, connection_id: &str) {
    let mut hub = state.lock_hub();

    if let Some(username) = hub.identities.remove(connection_id) {
        let owner = hub.registry.mark_offline(connection_id);
        debug_assert_eq!(owner.as_deref(), Some(username.as_str()));

        if hub.registry.has_active_sessions(&username) {
            hub.registry.prune_offline(&username);
            tracing::info!(
                username = %username,
                connection_id = %connection_id,
                "session closed, user still online elsewhere"
            );
        } else {
            hub.registry.evict(&username);
            tracing::info!(
                username = %username,
                connection_id = %connection_id,
                "last session closed, user offline"
            );
        }
    }

    roster::publish(&hub.registry, &state.connections);
}

fn login_error(tx: &ConnectionSender, request_id: &str, err: HubError) {
    send_event(
        tx,
        "loginError",
        request_id,
        &ErrorBody {
            message: err.to_string(),
        },
    );
}

/// Reject an action that requires authentication, without touching any state.
pub fn auth_error(tx: &ConnectionSender) {
    send_event(
        tx,
        "error",
        "",
        &ErrorBody {
            message: HubError::AuthenticationRequired.to_string(),
        },
    );
}
