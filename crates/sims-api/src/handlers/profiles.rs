//! Profile handlers
//!
//! Editing your own profile is allowed while the invite is pending; viewing
//! others requires the gate to be open.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap},
    Json,
};
use sims_service::dto::{
    ChangeTagRequest, ProfileResponse, PublicProfileResponse, SetAdminRequest,
    UpdateProfileRequest,
};
use sims_service::services::ProfileService;

use crate::extractors::{ApprovedUser, AuthUser, UuidPath, ValidatedJson};
use crate::response::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /profiles/me
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ProfileResponse>> {
    let service = ProfileService::new(state.service_context());
    Ok(Json(service.get_me(auth.user_id).await?))
}

/// PATCH /profiles/me
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let service = ProfileService::new(state.service_context());
    Ok(Json(service.update_profile(auth.user_id, request).await?))
}

/// PUT /profiles/me/tag
pub async fn change_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<ChangeTagRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let service = ProfileService::new(state.service_context());
    Ok(Json(service.change_tag(auth.user_id, request).await?))
}

/// Raw image body; the type comes from `Content-Type`
///
/// PUT /profiles/me/avatar
pub async fn upload_avatar(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<ProfileResponse>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::invalid_body("Content-Type header is required"))?;

    let service = ProfileService::new(state.service_context());
    let response = service
        .upload_avatar(auth.user_id, body.to_vec(), content_type)
        .await?;
    Ok(Json(response))
}

/// GET /profiles/{username}
pub async fn get_public(
    State(state): State<AppState>,
    user: ApprovedUser,
    Path(username): Path<String>,
) -> ApiResult<Json<PublicProfileResponse>> {
    let service = ProfileService::new(state.service_context());
    Ok(Json(service.get_public(user.user_id, &username).await?))
}

/// PUT /admin/profiles/{user_id}/admin
pub async fn set_admin(
    State(state): State<AppState>,
    auth: AuthUser,
    UuidPath(target_id): UuidPath,
    Json(request): Json<SetAdminRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let service = ProfileService::new(state.service_context());
    let response = service
        .set_admin(auth.user_id, target_id, request.is_admin)
        .await?;
    Ok(Json(response))
}
