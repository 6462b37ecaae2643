//! Notification entity - interaction feedback directed at a recipient

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Maximum length of a notification content preview, in characters
pub const PREVIEW_MAX_CHARS: usize = 100;

/// Closed set of notification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Mention,
    Like,
    Comment,
    FriendRequest,
    FriendAccepted,
    InviteApproved,
}

impl NotificationType {
    pub const ALL: [Self; 6] = [
        Self::Mention,
        Self::Like,
        Self::Comment,
        Self::FriendRequest,
        Self::FriendAccepted,
        Self::InviteApproved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mention => "mention",
            Self::Like => "like",
            Self::Comment => "comment",
            Self::FriendRequest => "friend_request",
            Self::FriendAccepted => "friend_accepted",
            Self::InviteApproved => "invite_approved",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::ValidationError(format!("unknown notification type: {s}")))
    }
}

/// Stored notification. Only `read` ever changes after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub actor_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub content: Option<String>,
    pub reference_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// A notification about to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub content: Option<String>,
    pub reference_id: Option<Uuid>,
}

impl NewNotification {
    pub fn new(user_id: Uuid, notification_type: NotificationType) -> Self {
        Self {
            user_id,
            actor_id: None,
            notification_type,
            content: None,
            reference_id: None,
        }
    }

    pub fn actor(mut self, actor_id: Uuid) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Attach a preview, truncated to [`PREVIEW_MAX_CHARS`]
    pub fn preview(mut self, text: &str) -> Self {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            self.content = Some(truncate_preview(trimmed, PREVIEW_MAX_CHARS));
        }
        self
    }

    pub fn reference(mut self, reference_id: Uuid) -> Self {
        self.reference_id = Some(reference_id);
        self
    }

    /// Materialize into a stored row
    pub fn into_notification(self) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            actor_id: self.actor_id,
            notification_type: self.notification_type,
            content: self.content,
            reference_id: self.reference_id,
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Truncate on a character boundary, appending an ellipsis when shortened
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_round_trip_names() {
        for t in NotificationType::ALL {
            assert_eq!(t.as_str().parse::<NotificationType>().unwrap(), t);
        }
        assert!("poke".parse::<NotificationType>().is_err());
    }

    #[test]
    fn test_truncate_preview() {
        assert_eq!(truncate_preview("short", 10), "short");
        let long = "é".repeat(150);
        let preview = truncate_preview(&long, PREVIEW_MAX_CHARS);
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS);
        assert!(preview.ends_with('…'));
    }

    #[test]
    fn test_builder() {
        let recipient = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let post = Uuid::new_v4();
        let n = NewNotification::new(recipient, NotificationType::Mention)
            .actor(actor)
            .preview("  hi @bob  ")
            .reference(post)
            .into_notification();

        assert_eq!(n.user_id, recipient);
        assert_eq!(n.actor_id, Some(actor));
        assert_eq!(n.content.as_deref(), Some("hi @bob"));
        assert_eq!(n.reference_id, Some(post));
        assert!(!n.read);
    }

    #[test]
    fn test_blank_preview_is_none() {
        let n = NewNotification::new(Uuid::new_v4(), NotificationType::Like).preview("   ");
        assert!(n.content.is_none());
    }

    #[test]
    fn test_serializes_type_field() {
        let n = NewNotification::new(Uuid::new_v4(), NotificationType::FriendAccepted)
            .into_notification();
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "friend_accepted");
    }
}
