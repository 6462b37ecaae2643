//! Identify handler (op 2)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::events::{GatewayEventType, ReadyEvent};
use crate::protocol::IdentifyPayload;
use crate::server::GatewayState;
use sims_core::AccessRoute;
use sims_service::dto::ProfileResponse;
use sims_service::services::{AuthService, InviteService, ServiceError, Session};

/// Handles Identify messages
pub struct IdentifyHandler;

impl IdentifyHandler {
    /// Authenticate, pass the feed gate, and start following the feed.
    ///
    /// Identifying again as another user switches the feed over; the same
    /// user again keeps what is already loaded.
    pub async fn handle(
        state: &GatewayState,
        connection: &mut Connection,
        payload: IdentifyPayload,
    ) -> HandlerResult<()> {
        let ctx = connection.ctx().clone();

        let user_id = AuthService::new(&ctx)
            .authenticate(payload.bare_token())
            .map_err(|e| {
                tracing::debug!(error = %e, "Token validation failed");
                HandlerError::AuthenticationFailed(e.to_string())
            })?;

        let profile = InviteService::new(&ctx)
            .require_feed_access(user_id)
            .await
            .map_err(|e| match e {
                ServiceError::InvitePending { status } => HandlerError::InvitePending(status),
                other => HandlerError::Service(other),
            })?;

        let route = if profile.is_admin {
            AccessRoute::Admin
        } else {
            AccessRoute::Feed
        };

        let switching = connection.feed().viewer_id() != Some(user_id);
        connection
            .session_store()
            .set(Session::new(profile.clone(), route));
        connection.feed_mut().set_viewer(Some(user_id)).await?;
        if switching {
            connection.pager().reset();
        }
        connection.watch_profiles().await?;

        let session_id = connection.session_id().to_string();
        state.connection_manager().set_user(&session_id, user_id);

        let ready = ReadyEvent {
            session_id: session_id.clone(),
            user_id,
            profile: ProfileResponse::from(&profile),
            route: route.into(),
        };
        connection.dispatch(GatewayEventType::Ready, &ready).await;

        tracing::info!(
            session_id = %session_id,
            user_id = %user_id,
            route = route.path(),
            "Client identified"
        );
        Ok(())
    }
}
