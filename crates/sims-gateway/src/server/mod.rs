//! Gateway server setup
//!
//! Provides the WebSocket server configuration and routes.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use crate::connection::ConnectionManager;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use sims_common::{AppConfig, AppError};
use sims_service::services::ServiceContext;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
}

#[derive(Debug, Serialize)]
struct GatewayHealth {
    status: &'static str,
    connections: usize,
    identified: usize,
}

async fn health_check(State(state): State<GatewayState>) -> Json<GatewayHealth> {
    let manager = state.connection_manager();
    Json(GatewayHealth {
        status: "ok",
        connections: manager.connection_count(),
        identified: manager.authenticated_count(),
    })
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Connect all dependencies and create `GatewayState`
pub async fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    tracing::info!("Connecting to PostgreSQL and Redis...");
    let service_context = ServiceContext::connect(&config)
        .await
        .map_err(|e| AppError::Config(e.to_string()))?;
    tracing::info!("Service context ready");

    Ok(GatewayState::new(
        service_context,
        ConnectionManager::new_shared(),
        config,
    ))
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on ws://{}/gateway", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config
        .gateway
        .address()
        .parse::<SocketAddr>()
        .map_err(|e| AppError::Config(format!("Invalid gateway address: {e}")))?;

    let state = create_gateway_state(config).await?;
    let app = create_app(state);

    run_server(app, addr).await
}
