use dashmap::DashMap;

use super::rooms::ConnectionId;

/// Online flags per boat emblem and the index of boat connections.
///
/// Created once at startup and shared by reference; nothing here survives a
/// restart.
#[derive(Debug, Default)]
pub struct PresenceState {
    online: DashMap<String, bool>,
    boat_sessions: DashMap<ConnectionId, String>,
}

impl PresenceState {
    pub fn set_online(&self, emblem: &str) {
        self.online.insert(emblem.to_string(), true);
    }

    pub fn set_offline(&self, emblem: &str) {
        self.online.insert(emblem.to_string(), false);
    }

    pub fn is_online(&self, emblem: &str) -> bool {
        self.online.get(emblem).map(|flag| *flag).unwrap_or(false)
    }

    pub fn bind_session(&self, connection_id: ConnectionId, emblem: &str) {
        self.boat_sessions.insert(connection_id, emblem.to_string());
    }

    /// Removes and returns the boat bound to this connection, if any.
    pub fn take_session(&self, connection_id: ConnectionId) -> Option<String> {
        self.boat_sessions
            .remove(&connection_id)
            .map(|(_, emblem)| emblem)
    }
}
