//! Push message built from a notification

use serde::Serialize;
use sims_core::{Notification, NotificationType};
use uuid::Uuid;

/// Where the client opens when a push is tapped
const NOTIFICATIONS_PATH: &str = "/notifications";

/// Title shown for each notification kind
pub fn title_for(notification_type: NotificationType) -> &'static str {
    match notification_type {
        NotificationType::Mention => "New mention",
        NotificationType::Like => "New like",
        NotificationType::Comment => "New comment",
        NotificationType::FriendRequest => "New friend request",
        NotificationType::FriendAccepted => "Friend request accepted",
        NotificationType::InviteApproved => "Your invite was approved",
    }
}

/// JSON body posted to a push endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub url: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<Uuid>,
}

impl From<&Notification> for PushMessage {
    fn from(notification: &Notification) -> Self {
        Self {
            title: title_for(notification.notification_type).to_string(),
            body: notification.content.clone().unwrap_or_default(),
            url: NOTIFICATIONS_PATH.to_string(),
            notification_type: notification.notification_type,
            reference_id: notification.reference_id,
        }
    }
}
