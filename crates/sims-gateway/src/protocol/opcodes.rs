//! Gateway operation codes

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Gateway operation codes
///
/// Op codes define the type of message being sent or received over the WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Server dispatches an event to the client (server only)
    Dispatch = 0,
    /// Keep the connection alive (client only)
    Heartbeat = 1,
    /// Authenticate and start following the feed (client only)
    Identify = 2,
    /// Show staged posts above the list (client only)
    MergePending = 3,
    /// Fetch the next older page (client only)
    LoadMore = 4,
    /// Sent on connect (server only)
    Hello = 10,
    /// Heartbeat acknowledged (server only)
    HeartbeatAck = 11,
}

impl OpCode {
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Dispatch),
            1 => Some(Self::Heartbeat),
            2 => Some(Self::Identify),
            3 => Some(Self::MergePending),
            4 => Some(Self::LoadMore),
            10 => Some(Self::Hello),
            11 => Some(Self::HeartbeatAck),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Check if this op code can be sent by the client
    #[must_use]
    pub const fn is_client_op(self) -> bool {
        matches!(
            self,
            Self::Heartbeat | Self::Identify | Self::MergePending | Self::LoadMore
        )
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dispatch => "Dispatch",
            Self::Heartbeat => "Heartbeat",
            Self::Identify => "Identify",
            Self::MergePending => "MergePending",
            Self::LoadMore => "LoadMore",
            Self::Hello => "Hello",
            Self::HeartbeatAck => "HeartbeatAck",
        }
    }
}

impl Serialize for OpCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for OpCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid op code: {value}")))
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_from_u8() {
        assert_eq!(OpCode::from_u8(2), Some(OpCode::Identify));
        assert_eq!(OpCode::from_u8(3), Some(OpCode::MergePending));
        assert_eq!(OpCode::from_u8(4), Some(OpCode::LoadMore));
        assert_eq!(OpCode::from_u8(5), None);
    }

    #[test]
    fn test_client_ops() {
        assert!(OpCode::LoadMore.is_client_op());
        assert!(OpCode::MergePending.is_client_op());
        assert!(!OpCode::Dispatch.is_client_op());
        assert!(!OpCode::HeartbeatAck.is_client_op());
    }

    #[test]
    fn test_opcode_serialization() {
        assert_eq!(serde_json::to_string(&OpCode::Hello).unwrap(), "10");
        let op: OpCode = serde_json::from_str("4").unwrap();
        assert_eq!(op, OpCode::LoadMore);
        assert!(serde_json::from_str::<OpCode>("9").is_err());
    }
}
