use axum::extract::ws::Message;

use super::ConnectionRegistry;

/// Broadcast a frame to every connected client.
/// Sends are fire-and-forget: a closed receiver just drops the frame.
pub fn broadcast_to_all(registry: &ConnectionRegistry, msg: &Message) {
    for entry in registry.iter() {
        let _ = entry.value().send(msg.clone());
    }
}

/// Broadcast a frame to every connected client except one.
pub fn broadcast_to_others(registry: &ConnectionRegistry, exclude_id: &str, msg: &Message) {
    for entry in registry.iter() {
        if entry.key() != exclude_id {
            let _ = entry.value().send(msg.clone());
        }
    }
}

/// Send a frame to one specific connection, if it is still registered.
pub fn send_to_connection(registry: &ConnectionRegistry, connection_id: &str, msg: &Message) {
    if let Some(sender) = registry.get(connection_id) {
        let _ = sender.send(msg.clone());
    }
}
