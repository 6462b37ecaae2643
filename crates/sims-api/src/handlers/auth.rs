//! Authentication handlers
//!
//! Endpoints for email sign-up/sign-in, token refresh, sign-out and the
//! post-login "where do I go" lookup.

use axum::{extract::State, Json};
use sims_service::dto::{
    CreateProfileRequest, MeResponse, ProfileResponse, RefreshTokenRequest, SessionResponse,
    SignInRequest, SignOutRequest, SignUpRequest,
};
use sims_service::services::AuthService;

use crate::extractors::{AuthUser, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// Register with email and password
///
/// POST /auth/signup
pub async fn sign_up(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SignUpRequest>,
) -> ApiResult<Created<Json<SessionResponse>>> {
    let service = AuthService::new(state.service_context());
    let response = service.sign_up_with_email(request).await?;
    Ok(Created(Json(response)))
}

/// Sign in with email and password
///
/// POST /auth/signin
pub async fn sign_in(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SignInRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let service = AuthService::new(state.service_context());
    let response = service.sign_in_with_email(request).await?;
    Ok(Json(response))
}

/// POST /auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let service = AuthService::new(state.service_context());
    let response = service.refresh(request).await?;
    Ok(Json(response))
}

/// POST /auth/signout
pub async fn sign_out(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Option<Json<SignOutRequest>>,
) -> ApiResult<NoContent> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    AuthService::new(state.service_context())
        .sign_out(auth.user_id, request)
        .await?;
    Ok(NoContent)
}

/// Profile, invite status and route for the caller
///
/// GET /auth/me
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<MeResponse>> {
    let service = AuthService::new(state.service_context());
    Ok(Json(service.current_user(auth.user_id).await?))
}

/// Create a profile for an identity that has none
///
/// POST /auth/profile
pub async fn create_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateProfileRequest>,
) -> ApiResult<Created<Json<ProfileResponse>>> {
    let service = AuthService::new(state.service_context());
    let response = service.create_profile(auth.user_id, request).await?;
    Ok(Created(Json(response)))
}
