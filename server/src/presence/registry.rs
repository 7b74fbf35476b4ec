//! The presence registry: username -> active sessions.
//!
//! A username is present in the map iff it has at least one session; the
//! user count is always derived from the key count, never tracked
//! separately. A user can hold several concurrent sessions (multiple
//! devices/tabs) under one key.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::events::{RosterEntry, SessionInfo};

/// One live connection under a username.
#[derive(Debug, Clone)]
pub struct Session {
    pub connection_id: String,
    pub full_name: String,
    pub login_time: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub source_url: String,
    pub client_agent: String,
    pub online: bool,
    pub status: Option<String>,
}

impl Session {
    pub fn new(
        connection_id: &str,
        full_name: &str,
        source_url: &str,
        client_agent: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            connection_id: connection_id.to_string(),
            full_name: full_name.to_string(),
            login_time: now,
            last_seen: now,
            source_url: source_url.to_string(),
            client_agent: client_agent.to_string(),
            online: true,
            status: None,
        }
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.connection_id.clone(),
            login_time: self.login_time,
            last_seen: self.last_seen,
            source_url: self.source_url.clone(),
            client_agent: self.client_agent.clone(),
            online: self.online,
            status: self.status.clone(),
        }
    }
}

/// In-memory registry mapping usernames to their active sessions.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    users: HashMap<String, Vec<Session>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct usernames currently registered.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Append a session under a username, creating the entry on first login.
    /// Connection ids are server-minted and unique by construction; if one
    /// collides anyway, the last write governs.
    pub fn register(&mut self, username: &str, session: Session) {
        let sessions = self.users.entry(username.to_string()).or_default();
        match sessions
            .iter()
            .position(|s| s.connection_id == session.connection_id)
        {
            Some(pos) => sessions[pos] = session,
            None => sessions.push(session),
        }
    }

    /// Mark the session owned by a connection as offline and stamp its
    /// `last_seen`. Returns the owning username, or `None` when no session
    /// matches.
    pub fn mark_offline(&mut self, connection_id: &str) -> Option<String> {
        for (username, sessions) in self.users.iter_mut() {
            if let Some(session) = sessions
                .iter_mut()
                .find(|s| s.connection_id == connection_id)
            {
                session.online = false;
                session.last_seen = Utc::now();
                return Some(username.clone());
            }
        }
        None
    }

    /// True iff any session under the username is still online.
    pub fn has_active_sessions(&self, username: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|sessions| sessions.iter().any(|s| s.online))
    }

    /// Drop sessions already marked offline from a username's list. Must only
    /// run while the username keeps at least one online session, so the
    /// non-empty-list invariant holds.
    pub fn prune_offline(&mut self, username: &str) {
        if let Some(sessions) = self.users.get_mut(username) {
            sessions.retain(|s| s.online);
            assert!(
                !sessions.is_empty(),
                "registry invariant violated: pruning left {username} with no sessions"
            );
        }
    }

    /// Remove a username entirely. Calling this while the username still has
    /// online sessions is a programming fault.
    pub fn evict(&mut self, username: &str) {
        assert!(
            !self.has_active_sessions(username),
            "registry invariant violated: evicting {username} with active sessions"
        );
        self.users.remove(username);
    }

    /// Update `last_seen` (and optionally the status text) on the session
    /// owned by a connection. Returns false when no session matches.
    pub fn touch(&mut self, connection_id: &str, status: Option<String>) -> bool {
        for sessions in self.users.values_mut() {
            if let Some(session) = sessions
                .iter_mut()
                .find(|s| s.connection_id == connection_id)
            {
                session.last_seen = Utc::now();
                if let Some(status) = status {
                    session.status = if status.is_empty() { None } else { Some(status) };
                }
                return true;
            }
        }
        false
    }

    /// All connection ids currently registered under a username, or `None`
    /// when the username is absent.
    pub fn connection_ids(&self, username: &str) -> Option<Vec<String>> {
        self.users.get(username).map(|sessions| {
            sessions.iter().map(|s| s.connection_id.clone()).collect()
        })
    }

    /// Immutable roster view, usernames sorted for a deterministic order.
    /// Does not mutate; O(total sessions).
    pub fn snapshot(&self) -> Vec<RosterEntry> {
        let mut usernames: Vec<&String> = self.users.keys().collect();
        usernames.sort();

        usernames
            .into_iter()
            .map(|username| {
                let sessions = &self.users[username];
                assert!(
                    !sessions.is_empty(),
                    "registry invariant violated: {username} has no sessions"
                );
                RosterEntry {
                    username: username.clone(),
                    full_name: sessions[0].full_name.clone(),
                    sessions: sessions.iter().map(Session::info).collect(),
                }
            })
            .collect()
    }
}
