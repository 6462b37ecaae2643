//! Gateway message format
//!
//! Defines the structure for all WebSocket messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{HelloPayload, IdentifyPayload, OpCode};

/// Gateway message format
///
/// All messages sent over the WebSocket connection follow this format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayMessage {
    /// Operation code
    pub op: OpCode,

    /// Event type (only for op=0 Dispatch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Sequence number (only for op=0 Dispatch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Event data payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
}

impl GatewayMessage {
    // === Server Messages ===

    /// Create a Dispatch message (op=0)
    #[must_use]
    pub fn dispatch(event_type: impl Into<String>, sequence: u64, data: Value) -> Self {
        Self {
            op: OpCode::Dispatch,
            t: Some(event_type.into()),
            s: Some(sequence),
            d: Some(data),
        }
    }

    /// Create a Hello message (op=10)
    #[must_use]
    pub fn hello(heartbeat_interval: u64) -> Self {
        Self {
            op: OpCode::Hello,
            t: None,
            s: None,
            d: serde_json::to_value(HelloPayload { heartbeat_interval }).ok(),
        }
    }

    /// Create a Heartbeat ACK message (op=11)
    #[must_use]
    pub fn heartbeat_ack() -> Self {
        Self {
            op: OpCode::HeartbeatAck,
            t: None,
            s: None,
            d: None,
        }
    }

    // === Parsing Client Messages ===

    /// Try to parse as an Identify payload (op=2)
    pub fn as_identify(&self) -> Option<IdentifyPayload> {
        if self.op != OpCode::Identify {
            return None;
        }
        self.d
            .as_ref()
            .and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    // === Utilities ===

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_serialization() {
        let msg = GatewayMessage::dispatch("NEW_POSTS", 3, serde_json::json!({ "count": 2 }));
        let json: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(json["op"], 0);
        assert_eq!(json["t"], "NEW_POSTS");
        assert_eq!(json["s"], 3);
        assert_eq!(json["d"]["count"], 2);
    }

    #[test]
    fn test_heartbeat_ack_has_no_payload() {
        let json = GatewayMessage::heartbeat_ack().to_json().unwrap();
        assert_eq!(json, r#"{"op":11}"#);
    }

    #[test]
    fn test_parse_identify() {
        let msg = GatewayMessage::from_json(r#"{"op":2,"d":{"token":"Bearer abc"}}"#).unwrap();
        let identify = msg.as_identify().unwrap();
        assert_eq!(identify.bare_token(), "abc");

        let msg = GatewayMessage::from_json(r#"{"op":4}"#).unwrap();
        assert!(msg.as_identify().is_none());
    }
}
