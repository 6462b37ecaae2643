//! Auth identities and sessions issued by the auth provider

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::value_objects::username;

/// Fallback when no usable name can be derived from the identity
const DEFAULT_USERNAME: &str = "user";

/// Supported OAuth providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Discord,
}

impl OAuthProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Discord => "discord",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "discord" => Ok(Self::Discord),
            _ => Err(DomainError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Metadata attached to an identity by the provider or at sign-up
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityMetadata {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub provider: Option<String>,
}

/// An authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub metadata: IdentityMetadata,
}

impl Identity {
    /// Name candidates in preference order: provider username, provider
    /// display name, then the local part of the email.
    fn name_candidates(&self) -> impl Iterator<Item = &str> {
        let local_part = self.email.split('@').next();
        [
            self.metadata.username.as_deref(),
            self.metadata.display_name.as_deref(),
            local_part,
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    }

    /// Default username for a first-time profile, falling back to `"user"`
    pub fn default_username(&self) -> String {
        self.name_candidates()
            .map(username::sanitize)
            .find(|s| username::validate_username(s).is_ok())
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string())
    }

    /// Default display name for a first-time profile, falling back to `"user"`
    pub fn default_display_name(&self) -> String {
        self.name_candidates()
            .next()
            .map(|s| {
                s.chars()
                    .take(crate::entities::profile::MAX_DISPLAY_NAME_LEN)
                    .collect()
            })
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string())
    }
}

/// Session issued after authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub identity: Identity,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Stored login credential for an identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub user_id: Uuid,
    pub email: String,
    /// `None` for identities that only sign in through OAuth
    pub password_hash: Option<String>,
    pub metadata: IdentityMetadata,
    pub created_at: DateTime<Utc>,
}

impl Credential {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.user_id,
            email: self.email.clone(),
            metadata: self.metadata.clone(),
        }
    }
}
