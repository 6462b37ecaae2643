//! Authentication extractors
//!
//! `AuthUser` validates the bearer token. `ApprovedUser` additionally
//! requires the invite gate to be open for the caller.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use sims_core::Profile;
use sims_service::services::{AuthService, InviteService};
use uuid::Uuid;

use crate::response::ApiError;
use crate::state::AppState;

/// Authenticated user extracted from JWT token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::MissingAuth)?;

        let app_state = AppState::from_ref(state);
        let user_id = AuthService::new(app_state.service_context())
            .authenticate(bearer.token())
            .map_err(|e| {
                tracing::warn!(error = %e, "Invalid access token");
                ApiError::from(e)
            })?;

        Ok(AuthUser { user_id })
    }
}

/// Signed-in user whose invite has been approved, or an admin
#[derive(Debug, Clone)]
pub struct ApprovedUser {
    pub user_id: Uuid,
    pub profile: Profile,
}

#[async_trait]
impl<S> FromRequestParts<S> for ApprovedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser { user_id } = AuthUser::from_request_parts(parts, state).await?;

        let app_state = AppState::from_ref(state);
        let profile = InviteService::new(app_state.service_context())
            .require_feed_access(user_id)
            .await?;

        Ok(ApprovedUser { user_id, profile })
    }
}
