//! Op code handlers
//!
//! Handles incoming WebSocket messages based on their operation code.

mod change;
mod error;
mod feed;
mod heartbeat;
mod identify;

pub use change::ChangeHandler;
pub use error::{HandlerError, HandlerResult};
pub use feed::FeedHandler;
pub use heartbeat::HeartbeatHandler;
pub use identify::IdentifyHandler;

use crate::connection::Connection;
use crate::protocol::{CloseCode, GatewayMessage, OpCode};
use crate::server::GatewayState;

/// Dispatch incoming client messages to appropriate handlers
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Handle an incoming client message. `Some` closes the socket with that code.
    pub async fn dispatch(
        state: &GatewayState,
        connection: &mut Connection,
        message: GatewayMessage,
    ) -> HandlerResult<Option<CloseCode>> {
        if !message.op.is_client_op() {
            tracing::warn!(
                session_id = %connection.session_id(),
                op = %message.op,
                "Received server-only op code from client"
            );
            return Ok(Some(CloseCode::UnknownOpcode));
        }

        match message.op {
            OpCode::Identify => {
                let payload = message.as_identify().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Identify payload".to_string())
                })?;
                IdentifyHandler::handle(state, connection, payload).await?;
            }
            OpCode::Heartbeat => HeartbeatHandler::handle(connection).await?,
            OpCode::MergePending => FeedHandler::merge_pending(connection).await?,
            OpCode::LoadMore => FeedHandler::load_more(connection).await?,
            _ => {
                tracing::error!(op = %message.op, "Unhandled client op code");
                return Ok(Some(CloseCode::UnknownOpcode));
            }
        }
        Ok(None)
    }
}
