//! Connection manager
//!
//! Tracks live sockets and who identified on them, using DashMap for
//! concurrent access from every socket task.

use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Registry of active WebSocket connections
#[derive(Debug, Default)]
pub struct ConnectionManager {
    /// Session ID to identified user
    connections: DashMap<String, Option<Uuid>>,
}

impl ConnectionManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn add_connection(&self, session_id: &str) {
        self.connections.insert(session_id.to_string(), None);
        tracing::debug!(session_id = %session_id, "Connection added");
    }

    /// Record who identified on a session
    pub fn set_user(&self, session_id: &str, user_id: Uuid) {
        if let Some(mut entry) = self.connections.get_mut(session_id) {
            *entry = Some(user_id);
        }
    }

    pub fn remove_connection(&self, session_id: &str) {
        if self.connections.remove(session_id).is_some() {
            tracing::debug!(session_id = %session_id, "Connection removed");
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn authenticated_count(&self) -> usize {
        self.connections.iter().filter(|e| e.value().is_some()).count()
    }

    /// Sessions a user currently has open
    pub fn sessions_for(&self, user_id: Uuid) -> Vec<String> {
        self.connections
            .iter()
            .filter(|e| *e.value() == Some(user_id))
            .map(|e| e.key().clone())
            .collect()
    }
}
