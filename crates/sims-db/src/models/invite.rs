//! Invite code database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for invite_codes table
#[derive(Debug, Clone, FromRow)]
pub struct InviteCodeModel {
    pub id: Uuid,
    pub code: String,
    pub used_by: Uuid,
    pub status: String,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl InviteCodeModel {
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == "pending"
    }
}

/// Invite joined with its owner's profile (admin listing)
#[derive(Debug, Clone, FromRow)]
pub struct InviteWithProfileModel {
    #[sqlx(flatten)]
    pub invite: InviteCodeModel,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}
