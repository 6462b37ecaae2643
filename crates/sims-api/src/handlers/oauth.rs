//! OAuth handlers
//!
//! The start endpoint hands back the provider's consent URL; the callback
//! always answers with a single redirect into the web app.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use sims_core::OAuthProvider;
use sims_service::dto::{OAuthCallbackQuery, OAuthStartResponse};
use sims_service::services::{AuthService, CallbackOutcome, OAuthCallbackService};
use tracing::{error, warn};

use crate::response::{ApiError, ApiResult};
use crate::state::AppState;

fn parse_provider(raw: &str) -> ApiResult<OAuthProvider> {
    raw.parse::<OAuthProvider>().map_err(ApiError::from)
}

/// GET /auth/oauth/{provider}
pub async fn start(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> ApiResult<Json<OAuthStartResponse>> {
    let provider = parse_provider(&provider)?;
    let service = AuthService::new(state.service_context());
    Ok(Json(service.sign_in_with_oauth(provider).await?))
}

/// GET /auth/oauth/{provider}/callback?code=..&state=..
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Redirect {
    let ctx = state.service_context();
    let base = &ctx.settings().app_redirect_base;

    let outcome = match (provider.parse::<OAuthProvider>(), query) {
        (Err(e), _) => CallbackOutcome::Failed(e.to_string()),
        (Ok(_), OAuthCallbackQuery { error: Some(reason), .. }) => {
            warn!(reason = %reason, "Provider returned an error");
            CallbackOutcome::Failed(reason)
        }
        (Ok(provider), OAuthCallbackQuery { code: Some(code), state: Some(flow_id), .. }) => {
            OAuthCallbackService::new(ctx)
                .handle(provider, &code, &flow_id)
                .await
                .unwrap_or_else(|e| {
                    error!(error = %e, "OAuth bootstrap failed");
                    CallbackOutcome::Failed(e.to_string())
                })
        }
        (Ok(_), _) => CallbackOutcome::Failed("missing code or state".to_string()),
    };

    Redirect::to(&outcome.redirect_url(base))
}
