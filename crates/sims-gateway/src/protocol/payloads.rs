//! Payloads carried by non-dispatch ops

use serde::{Deserialize, Serialize};

/// Hello payload (op 10)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// How often the client should send heartbeats
    pub heartbeat_interval: u64,
}

/// Identify payload (op 2)
#[derive(Debug, Clone, Deserialize)]
pub struct IdentifyPayload {
    /// Access token, with or without a `Bearer ` prefix
    pub token: String,
}

impl IdentifyPayload {
    pub fn bare_token(&self) -> &str {
        self.token.strip_prefix("Bearer ").unwrap_or(&self.token)
    }
}
