//! Gateway event types
//!
//! Defines all event type names for dispatch messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Gateway event types
///
/// These are the event names sent in the `t` field of dispatch messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayEventType {
    /// Sent after successful Identify
    Ready,
    /// Posts by others are waiting above the list
    NewPosts,
    /// Staged posts moved to the top
    PostsMerged,
    /// An older page was loaded
    Page,
    /// The signed-in profile changed
    ProfileUpdated,
    /// A request failed without closing the socket
    Error,
}

impl GatewayEventType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::NewPosts => "NEW_POSTS",
            Self::PostsMerged => "POSTS_MERGED",
            Self::Page => "PAGE",
            Self::ProfileUpdated => "PROFILE_UPDATED",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for GatewayEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_matches_serde() {
        for event in [
            GatewayEventType::Ready,
            GatewayEventType::NewPosts,
            GatewayEventType::PostsMerged,
            GatewayEventType::Page,
            GatewayEventType::ProfileUpdated,
            GatewayEventType::Error,
        ] {
            let json = serde_json::to_string(&event).unwrap();
            assert_eq!(json, format!("\"{}\"", event.as_str()));
        }
    }
}
