//! WebSocket close codes

/// Gateway WebSocket close codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CloseCode {
    /// Unknown error occurred
    UnknownError = 4000,
    /// Invalid opcode sent
    UnknownOpcode = 4001,
    /// Invalid payload encoding (JSON decode error)
    DecodeError = 4002,
    /// Sent a feed op before Identify
    NotAuthenticated = 4003,
    /// Invalid token provided
    AuthenticationFailed = 4004,
    /// No heartbeat within the timeout
    SessionTimeout = 4009,
    /// Signed in, but the invite is not approved
    InvitePending = 4013,
}

impl CloseCode {
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Short reason sent in the close frame
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::UnknownError => "Unknown error",
            Self::UnknownOpcode => "Unknown opcode",
            Self::DecodeError => "Decode error",
            Self::NotAuthenticated => "Not authenticated",
            Self::AuthenticationFailed => "Authentication failed",
            Self::SessionTimeout => "Session timed out",
            Self::InvitePending => "Invite pending approval",
        }
    }

    /// Whether the client should try to reconnect
    #[must_use]
    pub const fn can_reconnect(self) -> bool {
        matches!(
            self,
            Self::UnknownError | Self::DecodeError | Self::SessionTimeout
        )
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.reason(), self.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_code_values() {
        assert_eq!(CloseCode::AuthenticationFailed.as_u16(), 4004);
        assert_eq!(CloseCode::InvitePending.as_u16(), 4013);
    }

    #[test]
    fn test_reconnect_policy() {
        assert!(CloseCode::SessionTimeout.can_reconnect());
        assert!(!CloseCode::AuthenticationFailed.can_reconnect());
        assert!(!CloseCode::InvitePending.can_reconnect());
    }
}
