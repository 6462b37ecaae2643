//! Invite handlers
//!
//! The caller's own invite and the admin approval queue.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use sims_core::InviteState;
use sims_service::dto::{
    AdminInviteResponse, InviteListQuery, InviteResponse, InviteStatusResponse,
};
use sims_service::services::{InviteService, ServiceError};

use crate::extractors::{AuthUser, UuidPath};
use crate::response::ApiResult;
use crate::state::AppState;

/// Body of GET /invites/me/status
#[derive(Debug, Serialize)]
pub struct InviteStateBody {
    pub status: InviteState,
}

/// GET /invites/me
pub async fn my_invite(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<InviteResponse>> {
    InviteService::new(state.service_context())
        .get_my_invite(auth.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::not_found("Invite", auth.user_id.to_string()).into())
}

/// GET /invites/me/status
pub async fn my_status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<InviteStateBody>> {
    let status = InviteService::new(state.service_context())
        .check_invite_status(auth.user_id)
        .await?;
    Ok(Json(InviteStateBody { status }))
}

/// Re-check the gate from the pending screen
///
/// POST /invites/me/refresh
pub async fn refresh_status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<InviteStatusResponse>> {
    let service = InviteService::new(state.service_context());
    Ok(Json(service.refresh_invite_status(auth.user_id).await?))
}

/// GET /admin/invites?status=
pub async fn list_all(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<InviteListQuery>,
) -> ApiResult<Json<Vec<AdminInviteResponse>>> {
    let service = InviteService::new(state.service_context());
    Ok(Json(service.list_all_invites(auth.user_id, query).await?))
}

/// POST /admin/invites/{invite_id}/approve
pub async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    UuidPath(invite_id): UuidPath,
) -> ApiResult<Json<InviteResponse>> {
    let service = InviteService::new(state.service_context());
    Ok(Json(service.approve_invite(auth.user_id, invite_id).await?))
}

/// POST /admin/invites/{invite_id}/reject
pub async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    UuidPath(invite_id): UuidPath,
) -> ApiResult<Json<InviteResponse>> {
    let service = InviteService::new(state.service_context());
    Ok(Json(service.reject_invite(auth.user_id, invite_id).await?))
}
