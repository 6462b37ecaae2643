//! Profile database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for profiles table
#[derive(Debug, Clone, FromRow)]
pub struct ProfileModel {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub is_admin: bool,
    pub invite_code_used: Option<String>,
    pub tag_changed: bool,
    pub zen_background: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
