//! Friendship handlers

use axum::{extract::State, Json};
use serde::Serialize;
use sims_core::FriendshipStatus;
use sims_service::dto::{FriendRequestRequest, FriendResponse, FriendshipResponse};
use sims_service::services::FriendshipService;

use crate::extractors::{ApprovedUser, UuidPath};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// Body of GET /friends/status/{user_id}
#[derive(Debug, Serialize)]
pub struct FriendshipStatusResponse {
    pub status: FriendshipStatus,
}

/// GET /friends
pub async fn list_friends(
    State(state): State<AppState>,
    user: ApprovedUser,
) -> ApiResult<Json<Vec<FriendResponse>>> {
    let service = FriendshipService::new(state.service_context());
    Ok(Json(service.list_friends(user.user_id).await?))
}

/// Pending requests addressed to the caller
///
/// GET /friends/requests
pub async fn list_incoming(
    State(state): State<AppState>,
    user: ApprovedUser,
) -> ApiResult<Json<Vec<FriendResponse>>> {
    let service = FriendshipService::new(state.service_context());
    Ok(Json(service.list_incoming(user.user_id).await?))
}

/// POST /friends/requests
pub async fn send_request(
    State(state): State<AppState>,
    user: ApprovedUser,
    Json(request): Json<FriendRequestRequest>,
) -> ApiResult<Created<Json<FriendshipResponse>>> {
    let service = FriendshipService::new(state.service_context());
    let response = service.send_request(user.user_id, request.user_id).await?;
    Ok(Created(Json(response)))
}

/// POST /friends/requests/{friendship_id}/accept
pub async fn accept_request(
    State(state): State<AppState>,
    user: ApprovedUser,
    UuidPath(friendship_id): UuidPath,
) -> ApiResult<Json<FriendshipResponse>> {
    let service = FriendshipService::new(state.service_context());
    Ok(Json(service.accept_request(user.user_id, friendship_id).await?))
}

/// DELETE /friends/requests/{friendship_id}
pub async fn decline_request(
    State(state): State<AppState>,
    user: ApprovedUser,
    UuidPath(friendship_id): UuidPath,
) -> ApiResult<NoContent> {
    FriendshipService::new(state.service_context())
        .decline_request(user.user_id, friendship_id)
        .await?;
    Ok(NoContent)
}

/// DELETE /friends/{friendship_id}
pub async fn remove_friend(
    State(state): State<AppState>,
    user: ApprovedUser,
    UuidPath(friendship_id): UuidPath,
) -> ApiResult<NoContent> {
    FriendshipService::new(state.service_context())
        .remove_friend(user.user_id, friendship_id)
        .await?;
    Ok(NoContent)
}

/// GET /friends/status/{user_id}
pub async fn status_with(
    State(state): State<AppState>,
    user: ApprovedUser,
    UuidPath(other_id): UuidPath,
) -> ApiResult<Json<FriendshipStatusResponse>> {
    let status = FriendshipService::new(state.service_context())
        .status_with(user.user_id, other_id)
        .await?;
    Ok(Json(FriendshipStatusResponse { status }))
}
