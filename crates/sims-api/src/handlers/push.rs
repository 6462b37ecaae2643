//! Web-push subscription handlers

use axum::{extract::State, Json};
use sims_service::dto::{
    DeletePushSubscriptionRequest, PushSubscriptionRequest, PushSubscriptionResponse,
};
use sims_service::services::PushSubscriptionService;

use crate::extractors::{AuthUser, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// GET /push/subscriptions
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<PushSubscriptionResponse>>> {
    let service = PushSubscriptionService::new(state.service_context());
    Ok(Json(service.list(auth.user_id).await?))
}

/// Idempotent per endpoint
///
/// POST /push/subscriptions
pub async fn register(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<PushSubscriptionRequest>,
) -> ApiResult<Created<Json<PushSubscriptionResponse>>> {
    let service = PushSubscriptionService::new(state.service_context());
    let response = service.register(auth.user_id, request).await?;
    Ok(Created(Json(response)))
}

/// DELETE /push/subscriptions
pub async fn unregister(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<DeletePushSubscriptionRequest>,
) -> ApiResult<NoContent> {
    PushSubscriptionService::new(state.service_context())
        .unregister(auth.user_id, &request.endpoint)
        .await?;
    Ok(NoContent)
}
