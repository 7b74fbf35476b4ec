//! Roster publisher: derives the externally visible user list and count from
//! the registry and fans both out to every connection. Read-only with respect
//! to the registry — publishing never mutates.

use crate::presence::registry::PresenceRegistry;
use crate::ws::broadcast::broadcast_to_all;
use crate::ws::protocol::envelope;
use crate::ws::ConnectionRegistry;

/// Broadcast the current `userList` and `userCount` to all connections.
/// Must run after every registry mutation, inside the same hub critical
/// section, so clients observe each membership change exactly once.
pub fn publish(registry: &PresenceRegistry, connections: &ConnectionRegistry) {
    let roster = registry.snapshot();
    broadcast_to_all(connections, &envelope("userList", "", &roster));
    broadcast_to_all(connections, &envelope("userCount", "", &registry.user_count()));
}
