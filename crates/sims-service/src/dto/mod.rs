//! Data transfer objects for API requests and responses
//!
//! This module provides:
//! - Request DTOs with validation for API inputs
//! - Response DTOs for serializing API outputs
//! - Mappers for converting domain entities to DTOs

pub mod mappers;
pub mod requests;
pub mod responses;

// Re-export commonly used request types
pub use requests::{
    ChangeTagRequest, CreateCommentRequest, CreatePostRequest, CreateProfileRequest,
    DeletePushSubscriptionRequest, FeedQuery, FriendRequestRequest, InviteListQuery,
    NotificationQuery, OAuthCallbackQuery, PushKeys, PushSubscriptionRequest,
    RefreshTokenRequest, SetAdminRequest, SignInRequest, SignOutRequest, SignUpRequest,
    UpdateProfileRequest,
};

// Re-export commonly used response types
pub use responses::{
    AdminInviteResponse, ApiResponse, AuthorResponse, CommentResponse, FriendResponse,
    FriendshipResponse, HealthResponse, InviteResponse, InviteStatusResponse, MeResponse,
    NotificationResponse, OAuthStartResponse, PageResponse, PostResponse, ProfileResponse,
    PublicProfileResponse, PushSubscriptionResponse, RouteResponse, SessionResponse,
    UnreadCountResponse,
};
