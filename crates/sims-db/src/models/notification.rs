//! Notification database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for notifications table
#[derive(Debug, Clone, FromRow)]
pub struct NotificationModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub actor_id: Option<Uuid>,
    #[sqlx(rename = "type")]
    pub notification_type: String,
    pub content: Option<String>,
    pub reference_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
