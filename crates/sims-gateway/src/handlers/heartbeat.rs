//! Heartbeat handler (op 1)

use super::HandlerResult;
use crate::connection::Connection;
use crate::protocol::GatewayMessage;

/// Handles heartbeat messages
pub struct HeartbeatHandler;

impl HeartbeatHandler {
    pub async fn handle(connection: &mut Connection) -> HandlerResult<()> {
        connection.record_heartbeat();

        tracing::trace!(
            session_id = %connection.session_id(),
            server_seq = connection.current_sequence(),
            "Heartbeat received"
        );

        if !connection.send(GatewayMessage::heartbeat_ack()).await {
            tracing::warn!(
                session_id = %connection.session_id(),
                "Failed to send heartbeat ACK"
            );
        }
        Ok(())
    }
}
