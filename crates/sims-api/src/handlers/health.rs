//! Liveness probe

use axum::Json;
use sims_service::dto::HealthResponse;

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
