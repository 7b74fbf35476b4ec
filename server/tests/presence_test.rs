//! Integration tests for login, the roster lifecycle, and multi-session
//! presence aggregation.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn start_test_server() -> SocketAddr {
    let state = huddle_server::state::AppState::new();
    let app = huddle_server::routes::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// Connect and drain the `connected` + `messageHistory` greeting, returning
/// the stream and the assigned connection id.
async fn connect(addr: SocketAddr) -> (WsStream, String) {
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("Failed to connect to WebSocket");
    let connected = wait_for(&mut ws, "connected").await;
    let connection_id = connected["data"]["connectionId"].as_str().unwrap().to_string();
    wait_for(&mut ws, "messageHistory").await;
    (ws, connection_id)
}

async fn recv_event(ws: &mut WsStream) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("Timed out waiting for event")
            .expect("Stream ended")
            .expect("WebSocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("Invalid envelope JSON");
        }
    }
}

async fn wait_for(ws: &mut WsStream, event: &str) -> Value {
    loop {
        let env = recv_event(ws).await;
        if env["event"] == event {
            return env;
        }
    }
}

async fn send_envelope(ws: &mut WsStream, event: &str, request_id: &str, data: Value) {
    let frame = json!({ "event": event, "requestId": request_id, "data": data }).to_string();
    ws.send(Message::Text(frame.into())).await.expect("send failed");
}

async fn login(ws: &mut WsStream, username: &str, full_name: &str) -> Value {
    send_envelope(
        ws,
        "login",
        "login-req",
        json!({ "username": username, "fullName": full_name, "sourceUrl": "http://test", "clientAgent": "it" }),
    )
    .await;
    wait_for(ws, "loginSuccess").await
}

#[tokio::test]
async fn test_login_publishes_single_user_roster() {
    let addr = start_test_server().await;
    let (mut ws, connection_id) = connect(addr).await;

    let success = login(&mut ws, "alice", "Alice A").await;
    assert_eq!(success["requestId"], "login-req");
    assert_eq!(success["data"]["username"], "alice");
    assert_eq!(success["data"]["sessionId"], connection_id);

    let list = wait_for(&mut ws, "userList").await;
    let entries = list["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["username"], "alice");
    assert_eq!(entries[0]["fullName"], "Alice A");
    let sessions = entries[0]["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["sessionId"], connection_id);
    assert_eq!(sessions[0]["online"], true);

    let count = wait_for(&mut ws, "userCount").await;
    assert_eq!(count["data"], 1);
}

#[tokio::test]
async fn test_disconnect_removes_user_from_roster() {
    let addr = start_test_server().await;
    let (mut observer, _) = connect(addr).await;
    let (mut ws, _) = connect(addr).await;

    login(&mut ws, "alice", "Alice A").await;
    let count = wait_for(&mut observer, "userCount").await;
    assert_eq!(count["data"], 1);

    ws.send(Message::Close(None)).await.expect("close failed");

    // After the disconnect the roster goes back to empty.
    loop {
        let list = wait_for(&mut observer, "userList").await;
        if list["data"].as_array().unwrap().is_empty() {
            break;
        }
    }
    let count = wait_for(&mut observer, "userCount").await;
    assert_eq!(count["data"], 0);
}

#[tokio::test]
async fn test_two_sessions_same_username_count_once() {
    let addr = start_test_server().await;
    let (mut ws1, _) = connect(addr).await;
    let (mut ws2, _) = connect(addr).await;

    login(&mut ws1, "alice", "Alice A").await;
    login(&mut ws2, "alice", "Alice A").await;

    // The second login republishes: still one user, now two sessions.
    let list = wait_for(&mut ws2, "userList").await;
    let entries = list["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["sessions"].as_array().unwrap().len(), 2);

    let count = wait_for(&mut ws2, "userCount").await;
    assert_eq!(count["data"], 1);
}

#[tokio::test]
async fn test_one_of_two_sessions_disconnecting_keeps_user_online() {
    let addr = start_test_server().await;
    let (mut ws1, _) = connect(addr).await;
    let (mut ws2, id2) = connect(addr).await;

    login(&mut ws1, "alice", "Alice A").await;
    login(&mut ws2, "alice", "Alice A").await;

    ws1.send(Message::Close(None)).await.expect("close failed");

    // Wait for the roster where alice has exactly one session left.
    let sessions = loop {
        let list = wait_for(&mut ws2, "userList").await;
        let entries = list["data"].as_array().unwrap().clone();
        assert_eq!(entries.len(), 1, "alice must remain in the roster");
        let sessions = entries[0]["sessions"].as_array().unwrap().clone();
        if sessions.len() == 1 {
            break sessions;
        }
    };
    assert_eq!(sessions[0]["sessionId"], id2);
    assert_eq!(sessions[0]["online"], true);

    let count = wait_for(&mut ws2, "userCount").await;
    assert_eq!(count["data"], 1);
}

#[tokio::test]
async fn test_login_with_empty_username_is_rejected_then_retryable() {
    let addr = start_test_server().await;
    let (mut ws, _) = connect(addr).await;

    send_envelope(
        &mut ws,
        "login",
        "r1",
        json!({ "username": "   ", "fullName": "Alice A" }),
    )
    .await;
    let err = wait_for(&mut ws, "loginError").await;
    assert_eq!(err["requestId"], "r1");
    assert!(err["data"]["message"].as_str().unwrap().contains("username"));

    // The connection stays in the unauthenticated state and may retry.
    let success = login(&mut ws, "alice", "Alice A").await;
    assert_eq!(success["data"]["username"], "alice");
}

#[tokio::test]
async fn test_second_login_on_same_connection_is_rejected() {
    let addr = start_test_server().await;
    let (mut ws, _) = connect(addr).await;

    login(&mut ws, "alice", "Alice A").await;
    send_envelope(
        &mut ws,
        "login",
        "r2",
        json!({ "username": "bob", "fullName": "Bob B" }),
    )
    .await;

    let err = wait_for(&mut ws, "loginError").await;
    assert!(err["data"]["message"]
        .as_str()
        .unwrap()
        .contains("already logged in as alice"));
}

#[tokio::test]
async fn test_update_status_shows_in_roster_without_membership_change() {
    let addr = start_test_server().await;
    let (mut ws, _) = connect(addr).await;
    login(&mut ws, "alice", "Alice A").await;
    // Drain the roster pair published by the login itself.
    wait_for(&mut ws, "userCount").await;

    send_envelope(&mut ws, "updateStatus", "", json!("in a meeting")).await;

    let list = wait_for(&mut ws, "userList").await;
    let entries = list["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["sessions"][0]["status"], "in a meeting");

    let count = wait_for(&mut ws, "userCount").await;
    assert_eq!(count["data"], 1);
}

#[tokio::test]
async fn test_update_status_before_login_is_an_error() {
    let addr = start_test_server().await;
    let (mut ws, _) = connect(addr).await;

    send_envelope(&mut ws, "updateStatus", "", json!("sneaky")).await;

    let err = wait_for(&mut ws, "error").await;
    assert_eq!(err["data"]["message"], "authentication required");
}
