//! Event payload definitions

use serde::Serialize;
use sims_service::dto::{PostResponse, ProfileResponse, RouteResponse};
use uuid::Uuid;

/// READY event payload
///
/// Sent after successful Identify. `route` tells the client which screen to show.
#[derive(Debug, Clone, Serialize)]
pub struct ReadyEvent {
    pub session_id: String,
    pub user_id: Uuid,
    pub profile: ProfileResponse,
    pub route: RouteResponse,
}

/// NEW_POSTS event payload
#[derive(Debug, Clone, Serialize)]
pub struct NewPostsEvent {
    /// Posts staged and not yet merged
    pub count: usize,
}

/// POSTS_MERGED event payload
#[derive(Debug, Clone, Serialize)]
pub struct PostsMergedEvent {
    /// Newest first
    pub posts: Vec<PostResponse>,
}

/// PAGE event payload
#[derive(Debug, Clone, Serialize)]
pub struct PageEvent {
    pub posts: Vec<PostResponse>,
    pub has_more: bool,
}

/// PROFILE_UPDATED event payload
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdatedEvent {
    pub profile: ProfileResponse,
}

/// ERROR event payload
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    pub code: String,
    pub message: String,
}
