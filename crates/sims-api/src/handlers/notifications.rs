//! Notification handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use sims_service::dto::{NotificationQuery, NotificationResponse, PageResponse, UnreadCountResponse};
use sims_service::services::NotificationService;

use crate::extractors::{ApprovedUser, UuidPath};
use crate::response::{ApiResult, NoContent};
use crate::state::AppState;

/// Body of POST /notifications/read-all
#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// GET /notifications?unread_only=&limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    user: ApprovedUser,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Json<PageResponse<NotificationResponse>>> {
    let service = NotificationService::new(state.service_context());
    Ok(Json(service.list(user.user_id, query).await?))
}

/// GET /notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    user: ApprovedUser,
) -> ApiResult<Json<UnreadCountResponse>> {
    let service = NotificationService::new(state.service_context());
    Ok(Json(service.unread_count(user.user_id).await?))
}

/// POST /notifications/{notification_id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    user: ApprovedUser,
    UuidPath(notification_id): UuidPath,
) -> ApiResult<NoContent> {
    NotificationService::new(state.service_context())
        .mark_read(user.user_id, notification_id)
        .await?;
    Ok(NoContent)
}

/// POST /notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: ApprovedUser,
) -> ApiResult<Json<MarkAllReadResponse>> {
    let updated = NotificationService::new(state.service_context())
        .mark_all_read(user.user_id)
        .await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
