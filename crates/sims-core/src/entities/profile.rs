//! Profile entity - one per authenticated account

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::value_objects::username;

/// Maximum display name length in characters
pub const MAX_DISPLAY_NAME_LEN: usize = 50;

/// Maximum bio length in characters
pub const MAX_BIO_LEN: usize = 160;

/// Profile entity. The id is the auth identity id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
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

impl Profile {
    /// Create a new non-admin profile
    pub fn new(id: Uuid, username: String, display_name: String) -> Self {
        Self {
            id,
            username,
            display_name,
            avatar_url: None,
            banner_url: None,
            bio: None,
            website: None,
            is_admin: false,
            invite_code_used: None,
            tag_changed: false,
            zen_background: None,
            created_at: Utc::now(),
        }
    }

    /// Username without the `#NNNN` tag
    pub fn base_username(&self) -> &str {
        username::split_tag(&self.username).0
    }

    /// The 4-digit tag, if the username carries one
    pub fn tag(&self) -> Option<&str> {
        username::split_tag(&self.username).1
    }

    /// Replace the tag. Allowed exactly once per profile.
    pub fn change_tag(&mut self, tag: &str) -> Result<(), DomainError> {
        if self.tag_changed {
            return Err(DomainError::TagAlreadyChanged);
        }
        if !username::is_valid_tag(tag) {
            return Err(DomainError::InvalidTag(tag.to_string()));
        }
        self.username = format!("{}#{tag}", self.base_username());
        self.tag_changed = true;
        Ok(())
    }

    /// Validate the user-editable fields
    pub fn validate(&self) -> Result<(), DomainError> {
        username::validate_username(&self.username)?;

        let display_len = self.display_name.trim().chars().count();
        if display_len == 0 {
            return Err(DomainError::ValidationError(
                "display name is required".to_string(),
            ));
        }
        if display_len > MAX_DISPLAY_NAME_LEN {
            return Err(DomainError::ContentTooLong {
                max: MAX_DISPLAY_NAME_LEN,
            });
        }

        if let Some(bio) = &self.bio {
            if bio.chars().count() > MAX_BIO_LEN {
                return Err(DomainError::ContentTooLong { max: MAX_BIO_LEN });
            }
        }

        if let Some(website) = &self.website {
            if !is_http_url(website) {
                return Err(DomainError::InvalidUrl(website.clone()));
            }
        }

        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.contains(char::is_whitespace))
}
