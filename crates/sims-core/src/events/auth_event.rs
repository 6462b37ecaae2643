//! Auth state change events

use serde::{Deserialize, Serialize};

use crate::entities::AuthSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Emitted by the auth provider whenever a session materializes or ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<AuthSession>,
    /// Correlates the event with the OAuth flow that produced it
    pub flow_id: Option<String>,
}

impl AuthEvent {
    pub fn signed_in(session: AuthSession, flow_id: Option<String>) -> Self {
        Self {
            kind: AuthEventKind::SignedIn,
            session: Some(session),
            flow_id,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: AuthEventKind::SignedOut,
            session: None,
            flow_id: None,
        }
    }

    /// Whether this is the `SIGNED_IN` event for `flow_id`
    pub fn is_sign_in_for(&self, flow_id: &str) -> bool {
        self.kind == AuthEventKind::SignedIn && self.flow_id.as_deref() == Some(flow_id)
    }
}
