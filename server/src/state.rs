use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::chat::history::HistoryBuffer;
use crate::presence::registry::PresenceRegistry;
use crate::ws::ConnectionRegistry;

/// The hub's single-writer core: presence registry, message history, and the
/// connection-id -> username association. Every inbound event locks this once,
/// applies its full effect (mutation + roster publish), and releases — one
/// event fully applied before the next.
#[derive(Debug, Default)]
pub struct HubState {
    pub registry: PresenceRegistry,
    pub history: HistoryBuffer,
    /// Which username a connection authenticated as. Set once at login,
    /// removed on disconnect; absent for unauthenticated connections.
    pub identities: HashMap<String, String>,
}

impl HubState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The username a connection authenticated as, if any.
    pub fn username_of(&self, connection_id: &str) -> Option<&String> {
        self.identities.get(connection_id)
    }
}

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Active WebSocket connections by connection id.
    pub connections: ConnectionRegistry,
    /// Mutex-guarded hub core. A poisoned lock means an event handler
    /// panicked mid-mutation; continuing would propagate inconsistent state,
    /// so lock acquisition fails loudly.
    pub hub: Arc<Mutex<HubState>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            connections: crate::ws::new_connection_registry(),
            hub: Arc::new(Mutex::new(HubState::new())),
        }
    }

    pub fn lock_hub(&self) -> MutexGuard<'_, HubState> {
        self.hub.lock().expect("hub state lock poisoned")
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
