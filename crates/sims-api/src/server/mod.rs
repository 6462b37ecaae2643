//! Server setup and initialization
//!
//! Provides the main application builder and server runner.

use std::net::SocketAddr;

use axum::Router;
use sims_common::{AppConfig, AppError};
use sims_service::services::ServiceContext;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::info;

use crate::middleware::apply_middleware;
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let config = state.config();
    let max_upload = state.service_context().settings().max_upload_bytes;

    let api = apply_middleware(
        create_router(max_upload),
        &config.rate_limit,
        &config.cors,
        config.app.env.is_production(),
    );

    Router::new()
        .merge(health_routes())
        .merge(api)
        .nest_service("/uploads", ServeDir::new(&config.storage.upload_dir))
        .with_state(state)
}

/// Connect all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    info!("Connecting to PostgreSQL and Redis...");
    let service_context = ServiceContext::connect(&config)
        .await
        .map_err(|e| AppError::Config(e.to_string()))?;
    info!("Service context ready");

    Ok(AppState::new(service_context, config))
}

/// Run the HTTP server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config
        .api
        .address()
        .parse::<SocketAddr>()
        .map_err(|e| AppError::Config(format!("Invalid API address: {e}")))?;

    let state = create_app_state(config).await?;
    let app = create_app(state);

    run_server(app, addr).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use sims_service::testing::TestHarness;
    use tower::ServiceExt;

    fn app() -> Router {
        let harness = TestHarness::new();
        create_app(AppState::new(harness.ctx.clone(), AppConfig::for_testing()))
    }

    #[tokio::test]
    async fn test_health_is_served_outside_api_prefix() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_api_responses_carry_request_id() {
        let response = app()
            .oneshot(Request::get("/api/v1/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response
            .headers()
            .contains_key(crate::middleware::REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = app()
            .oneshot(Request::get("/api/v1/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
