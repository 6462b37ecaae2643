//! Gateway state
//!
//! Application state for the gateway server.

use crate::connection::ConnectionManager;
use sims_common::AppConfig;
use sims_service::services::ServiceContext;
use std::sync::Arc;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server.
#[derive(Clone)]
pub struct GatewayState {
    service_context: Arc<ServiceContext>,
    connection_manager: Arc<ConnectionManager>,
    config: Arc<AppConfig>,
}

impl GatewayState {
    pub fn new(
        service_context: ServiceContext,
        connection_manager: Arc<ConnectionManager>,
        config: AppConfig,
    ) -> Self {
        Self {
            service_context: Arc::new(service_context),
            connection_manager,
            config: Arc::new(config),
        }
    }

    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    /// Shared handle for per-connection state
    pub fn service_context_arc(&self) -> Arc<ServiceContext> {
        self.service_context.clone()
    }

    pub fn connection_manager(&self) -> &ConnectionManager {
        &self.connection_manager
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("connection_manager", &self.connection_manager)
            .field("config", &"AppConfig")
            .finish()
    }
}
