//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use serde::Deserialize;
use sims_core::InviteStatus;
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Auth Requests
// ============================================================================

/// Email registration request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 72, message = "Password must be 8-72 characters"))]
    pub password: String,

    /// Preferred username; the email local part is used when absent
    #[validate(length(min = 3, max = 32, message = "Username must be 3-32 characters"))]
    pub username: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Display name must be 1-50 characters"))]
    pub display_name: Option<String>,
}

/// Email sign-in request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Token refresh request
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Sign-out request (optional refresh token to revoke)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SignOutRequest {
    pub refresh_token: Option<String>,
}

/// Query string on the OAuth callback
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

// ============================================================================
// Profile Requests
// ============================================================================

/// Explicit profile creation for an identity that has none yet
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProfileRequest {
    #[validate(length(min = 3, max = 32, message = "Username must be 3-32 characters"))]
    pub username: String,

    #[validate(length(min = 1, max = 50, message = "Display name must be 1-50 characters"))]
    pub display_name: String,
}

/// Partial profile update. Absent fields are left alone; an empty string clears.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50, message = "Display name must be 1-50 characters"))]
    pub display_name: Option<String>,

    #[validate(length(max = 160, message = "Bio must be at most 160 characters"))]
    pub bio: Option<String>,

    #[validate(length(max = 255, message = "Website must be at most 255 characters"))]
    pub website: Option<String>,

    pub banner_url: Option<String>,

    pub zen_background: Option<serde_json::Value>,
}

/// One-time tag change
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangeTagRequest {
    #[validate(length(equal = 4, message = "Tag must be exactly 4 digits"))]
    pub tag: String,
}

/// Grant or revoke admin on another profile
#[derive(Debug, Clone, Deserialize)]
pub struct SetAdminRequest {
    pub is_admin: bool,
}

// ============================================================================
// Invite Requests
// ============================================================================

/// Admin invite listing filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InviteListQuery {
    pub status: Option<InviteStatus>,
}

// ============================================================================
// Post Requests
// ============================================================================

/// Create post request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(max = 280, message = "Post must be at most 280 characters"))]
    pub content: Option<String>,

    #[validate(length(max = 4, message = "At most 4 images per post"))]
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// Create comment request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 280, message = "Comment must be 1-280 characters"))]
    pub content: String,
}

/// Offset pagination for the feed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ============================================================================
// Notification Requests
// ============================================================================

/// Notification listing options
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ============================================================================
// Friendship Requests
// ============================================================================

/// Send a friend request
#[derive(Debug, Clone, Deserialize)]
pub struct FriendRequestRequest {
    pub user_id: Uuid,
}

// ============================================================================
// Push Requests
// ============================================================================

/// Keys of a browser `PushSubscription`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PushKeys {
    #[validate(length(min = 1, message = "p256dh key is required"))]
    pub p256dh: String,

    #[validate(length(min = 1, message = "auth secret is required"))]
    pub auth: String,
}

/// Browser `PushSubscription.toJSON()` payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PushSubscriptionRequest {
    #[validate(url(message = "Endpoint must be a URL"))]
    pub endpoint: String,

    #[validate(nested)]
    pub keys: PushKeys,
}

/// Remove a push subscription
#[derive(Debug, Clone, Deserialize)]
pub struct DeletePushSubscriptionRequest {
    pub endpoint: String,
}
