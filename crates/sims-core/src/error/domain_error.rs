//! Domain errors - error types for the domain layer

use thiserror::Error;
use uuid::Uuid;

use crate::entities::InviteStatus;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Profile not found: {0}")]
    ProfileNotFound(Uuid),

    #[error("Invite not found: {0}")]
    InviteNotFound(Uuid),

    #[error("Post not found: {0}")]
    PostNotFound(Uuid),

    #[error("Notification not found: {0}")]
    NotificationNotFound(Uuid),

    #[error("Friend request not found")]
    FriendshipNotFound,

    #[error("Push subscription not found")]
    SubscriptionNotFound,

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Too many images: max {max}")]
    TooManyImages { max: usize },

    #[error("Post must contain text or at least one image")]
    EmptyPost,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Tag has already been changed")]
    TagAlreadyChanged,

    // =========================================================================
    // Authentication Errors
    // =========================================================================
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Unsupported OAuth provider: {0}")]
    UnsupportedProvider(String),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Admin privileges required")]
    NotAdmin,

    #[error("Not post author")]
    NotPostAuthor,

    #[error("Only the recipient can answer a friend request")]
    NotRequestRecipient,

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Email already in use")]
    EmailAlreadyExists,

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Profile already exists")]
    ProfileAlreadyExists,

    #[error("Invite code already exists")]
    InviteCodeExists,

    #[error("User already has an invite")]
    InviteAlreadyExists,

    #[error("Friend request already exists")]
    FriendshipExists,

    // =========================================================================
    // Business Rule Violations
    // =========================================================================
    #[error("Invite cannot move from {from} to {to}")]
    InvalidInviteTransition { from: InviteStatus, to: InviteStatus },

    #[error("Cannot send a friend request to yourself")]
    CannotFriendSelf,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::ProfileNotFound(_) => "UNKNOWN_PROFILE",
            Self::InviteNotFound(_) => "UNKNOWN_INVITE",
            Self::PostNotFound(_) => "UNKNOWN_POST",
            Self::NotificationNotFound(_) => "UNKNOWN_NOTIFICATION",
            Self::FriendshipNotFound => "UNKNOWN_FRIENDSHIP",
            Self::SubscriptionNotFound => "UNKNOWN_SUBSCRIPTION",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidUsername(_) => "INVALID_USERNAME",
            Self::InvalidTag(_) => "INVALID_TAG",
            Self::WeakPassword(_) => "WEAK_PASSWORD",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::TooManyImages { .. } => "TOO_MANY_IMAGES",
            Self::EmptyPost => "EMPTY_POST",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::TagAlreadyChanged => "TAG_ALREADY_CHANGED",

            // Authentication
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::UnsupportedProvider(_) => "UNSUPPORTED_PROVIDER",

            // Authorization
            Self::NotAdmin => "NOT_ADMIN",
            Self::NotPostAuthor => "NOT_POST_AUTHOR",
            Self::NotRequestRecipient => "NOT_REQUEST_RECIPIENT",

            // Conflict
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::UsernameTaken(_) => "USERNAME_TAKEN",
            Self::ProfileAlreadyExists => "PROFILE_ALREADY_EXISTS",
            Self::InviteCodeExists => "INVITE_CODE_EXISTS",
            Self::InviteAlreadyExists => "INVITE_ALREADY_EXISTS",
            Self::FriendshipExists => "FRIENDSHIP_EXISTS",

            // Business Rules
            Self::InvalidInviteTransition { .. } => "INVALID_INVITE_TRANSITION",
            Self::CannotFriendSelf => "CANNOT_FRIEND_SELF",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::StorageError(_) => "STORAGE_ERROR",
            Self::ExternalServiceError(_) => "EXTERNAL_SERVICE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProfileNotFound(_)
                | Self::InviteNotFound(_)
                | Self::PostNotFound(_)
                | Self::NotificationNotFound(_)
                | Self::FriendshipNotFound
                | Self::SubscriptionNotFound
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidEmail
                | Self::InvalidUsername(_)
                | Self::InvalidTag(_)
                | Self::WeakPassword(_)
                | Self::ContentTooLong { .. }
                | Self::TooManyImages { .. }
                | Self::EmptyPost
                | Self::InvalidUrl(_)
                | Self::TagAlreadyChanged
                | Self::CannotFriendSelf
        )
    }

    /// Check if this is an authentication error
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::InvalidToken | Self::UnsupportedProvider(_)
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::NotAdmin | Self::NotPostAuthor | Self::NotRequestRecipient
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::EmailAlreadyExists
                | Self::UsernameTaken(_)
                | Self::ProfileAlreadyExists
                | Self::InviteCodeExists
                | Self::InviteAlreadyExists
                | Self::FriendshipExists
                | Self::InvalidInviteTransition { .. }
        )
    }
}
