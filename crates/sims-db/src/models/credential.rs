//! Credential database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for auth_identities table
#[derive(Debug, Clone, FromRow)]
pub struct CredentialModel {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
