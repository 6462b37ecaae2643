//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sims_core::{
    AccessRoute, FriendshipStatus, InviteState, InviteStatus, NotificationType, Segment,
};
use uuid::Uuid;

// ============================================================================
// Common Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Offset-paginated list
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    /// Offset to request next, when `has_more`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<i64>,
}

impl<T> PageResponse<T> {
    /// A short page means the end was reached
    pub fn new(items: Vec<T>, offset: i64, limit: i64) -> Self {
        let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
        let has_more = len >= limit;
        Self {
            items,
            has_more,
            next_offset: has_more.then_some(offset + len),
        }
    }
}

// ============================================================================
// Auth Responses
// ============================================================================

/// Session issued after sign-in, with where the client should go next
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub profile: ProfileResponse,
    pub route: RouteResponse,
}

/// Routing decision for a signed-in user
#[derive(Debug, Clone, Serialize)]
pub struct RouteResponse {
    pub name: AccessRoute,
    pub path: &'static str,
}

impl From<AccessRoute> for RouteResponse {
    fn from(route: AccessRoute) -> Self {
        Self {
            name: route,
            path: route.path(),
        }
    }
}

/// Where to send the browser to start an OAuth flow
#[derive(Debug, Serialize)]
pub struct OAuthStartResponse {
    pub authorize_url: String,
    pub flow_id: String,
}

/// The signed-in user with their gate state
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub profile: ProfileResponse,
    pub invite_status: InviteState,
    pub route: RouteResponse,
}

// ============================================================================
// Profile Responses
// ============================================================================

/// Full profile, as seen by its owner
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
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

/// Profile as seen by another user
#[derive(Debug, Clone, Serialize)]
pub struct PublicProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub zen_background: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub friendship: FriendshipStatus,
}

/// Author fields embedded in posts and comments
#[derive(Debug, Clone, Serialize)]
pub struct AuthorResponse {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

// ============================================================================
// Invite Responses
// ============================================================================

/// The caller's own invite
#[derive(Debug, Clone, Serialize)]
pub struct InviteResponse {
    pub id: Uuid,
    pub code: String,
    pub status: InviteStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Gate state after a status refresh
#[derive(Debug, Clone, Serialize)]
pub struct InviteStatusResponse {
    pub status: InviteState,
    pub invite_code_used: Option<String>,
    pub route: RouteResponse,
}

/// Invite with its requester, for the admin queue
#[derive(Debug, Clone, Serialize)]
pub struct AdminInviteResponse {
    #[serde(flatten)]
    pub invite: InviteResponse,
    pub used_by: Uuid,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

// ============================================================================
// Post Responses
// ============================================================================

/// Post as rendered for a viewer
#[derive(Debug, Clone, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub author: AuthorResponse,
    pub content: Option<String>,
    /// `content` split into text, mention and link segments
    pub segments: Vec<Segment>,
    pub image_urls: Vec<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked_by_me: bool,
    pub created_at: DateTime<Utc>,
}

/// Comment with its author
#[derive(Debug, Clone, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: AuthorResponse,
    pub content: String,
    pub segments: Vec<Segment>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Notification Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub actor_id: Option<Uuid>,
    pub content: Option<String>,
    pub reference_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

// ============================================================================
// Friendship Responses
// ============================================================================

/// A friendship row from the caller's side
#[derive(Debug, Clone, Serialize)]
pub struct FriendshipResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
}

/// A friend or requester with their public fields
#[derive(Debug, Clone, Serialize)]
pub struct FriendResponse {
    pub friendship_id: Uuid,
    pub status: FriendshipStatus,
    pub user: AuthorResponse,
    pub since: DateTime<Utc>,
}

// ============================================================================
// Push Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PushSubscriptionResponse {
    pub id: Uuid,
    pub endpoint: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Health Responses
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}
