//! Feed, post, comment and like handlers
//!
//! Everything here sits behind the invite gate.

use axum::{extract::State, Json};
use sims_service::dto::{
    CommentResponse, CreateCommentRequest, CreatePostRequest, PageResponse, PostResponse,
};
use sims_service::services::PostService;

use crate::extractors::{ApprovedUser, Pagination, UuidPath, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// Newest first
///
/// GET /feed?limit=&offset=
pub async fn list_feed(
    State(state): State<AppState>,
    user: ApprovedUser,
    page: Pagination,
) -> ApiResult<Json<PageResponse<PostResponse>>> {
    let service = PostService::new(state.service_context());
    Ok(Json(service.list_feed(user.user_id, page.into()).await?))
}

/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    user: ApprovedUser,
    ValidatedJson(request): ValidatedJson<CreatePostRequest>,
) -> ApiResult<Created<Json<PostResponse>>> {
    let service = PostService::new(state.service_context());
    let response = service.create_post(user.user_id, request).await?;
    Ok(Created(Json(response)))
}

/// GET /posts/{post_id}
pub async fn get_post(
    State(state): State<AppState>,
    user: ApprovedUser,
    UuidPath(post_id): UuidPath,
) -> ApiResult<Json<PostResponse>> {
    let service = PostService::new(state.service_context());
    Ok(Json(service.get_post(user.user_id, post_id).await?))
}

/// DELETE /posts/{post_id}
pub async fn delete_post(
    State(state): State<AppState>,
    user: ApprovedUser,
    UuidPath(post_id): UuidPath,
) -> ApiResult<NoContent> {
    PostService::new(state.service_context())
        .delete_post(user.user_id, post_id)
        .await?;
    Ok(NoContent)
}

/// GET /posts/{post_id}/comments
pub async fn list_comments(
    State(state): State<AppState>,
    _user: ApprovedUser,
    UuidPath(post_id): UuidPath,
) -> ApiResult<Json<Vec<CommentResponse>>> {
    let service = PostService::new(state.service_context());
    Ok(Json(service.list_comments(post_id).await?))
}

/// POST /posts/{post_id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    user: ApprovedUser,
    UuidPath(post_id): UuidPath,
    ValidatedJson(request): ValidatedJson<CreateCommentRequest>,
) -> ApiResult<Created<Json<CommentResponse>>> {
    let service = PostService::new(state.service_context());
    let response = service.add_comment(user.user_id, post_id, request).await?;
    Ok(Created(Json(response)))
}

/// PUT /posts/{post_id}/like
pub async fn like(
    State(state): State<AppState>,
    user: ApprovedUser,
    UuidPath(post_id): UuidPath,
) -> ApiResult<Json<PostResponse>> {
    let service = PostService::new(state.service_context());
    Ok(Json(service.like_post(user.user_id, post_id).await?))
}

/// DELETE /posts/{post_id}/like
pub async fn unlike(
    State(state): State<AppState>,
    user: ApprovedUser,
    UuidPath(post_id): UuidPath,
) -> ApiResult<Json<PostResponse>> {
    let service = PostService::new(state.service_context());
    Ok(Json(service.unlike_post(user.user_id, post_id).await?))
}
