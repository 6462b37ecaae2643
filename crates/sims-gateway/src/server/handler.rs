//! WebSocket handler
//!
//! One task per socket owns the [`Connection`] and multiplexes client
//! frames, change-feed events and the heartbeat check. A second task writes
//! to the socket.

use crate::connection::{Connection, Outbound};
use crate::events::{ErrorEvent, GatewayEventType};
use crate::handlers::{ChangeHandler, HandlerError, MessageDispatcher};
use crate::protocol::{CloseCode, GatewayMessage};
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Channel buffer size for outgoing messages
const MESSAGE_BUFFER_SIZE: usize = 100;

/// How long teardown waits for the close frame to flush
const SEND_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let session_id = Connection::generate_id();
    let (tx, mut rx) = mpsc::channel::<Outbound>(MESSAGE_BUFFER_SIZE);

    state.connection_manager().add_connection(&session_id);
    let mut connection = Connection::new(session_id.clone(), state.service_context_arc(), tx);

    tracing::info!(session_id = %session_id, "WebSocket connection established");

    let (mut ws_sink, mut ws_stream) = socket.split();

    let heartbeat_interval_ms = state.config().gateway.heartbeat_interval_ms.max(1);
    let hello = GatewayMessage::hello(heartbeat_interval_ms);
    if let Ok(json) = hello.to_json() {
        if ws_sink.send(Message::Text(json.into())).await.is_err() {
            tracing::warn!(session_id = %session_id, "Failed to send Hello message");
            state.connection_manager().remove_connection(&session_id);
            return;
        }
    }

    let session_id_send = session_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            match outbound {
                Outbound::Message(msg) => {
                    let Ok(json) = msg.to_json() else { continue };
                    if ws_sink.send(Message::Text(json.into())).await.is_err() {
                        tracing::warn!(
                            session_id = %session_id_send,
                            "Failed to send message to WebSocket"
                        );
                        break;
                    }
                }
                Outbound::Close(code) => {
                    let frame = CloseFrame {
                        code: code.as_u16(),
                        reason: code.reason().into(),
                    };
                    let _ = ws_sink.send(Message::Close(Some(frame))).await;
                    break;
                }
            }
        }
        let _ = ws_sink.close().await;
    });

    let heartbeat_timeout = Duration::from_millis(heartbeat_interval_ms * 2);
    let mut check_interval = interval(Duration::from_millis(heartbeat_interval_ms / 2 + 1));

    let close_code = loop {
        tokio::select! {
            msg = ws_stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if let Err(code) = handle_text_message(&state, &mut connection, &text).await {
                        break Some(code);
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    tracing::debug!(session_id = %session_id, "Binary messages not supported");
                    break Some(CloseCode::DecodeError);
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!(session_id = %session_id, "Client closed connection");
                    break None;
                }
                Some(Err(e)) => {
                    tracing::warn!(session_id = %session_id, error = %e, "WebSocket error");
                    break None;
                }
            },
            change = connection.next_change() => match change {
                Some(change) => {
                    if let Err(e) = ChangeHandler::handle(&mut connection, change).await {
                        tracing::warn!(session_id = %session_id, error = %e, "Change handling failed");
                    }
                }
                None => {
                    tracing::warn!(session_id = %session_id, "Feed subscription ended");
                    break Some(CloseCode::UnknownError);
                }
            },
            _ = check_interval.tick() => {
                let since = connection.time_since_heartbeat();
                if since > heartbeat_timeout {
                    tracing::warn!(
                        session_id = %session_id,
                        time_since_ms = since.as_millis(),
                        "Connection timed out (no heartbeat)"
                    );
                    break Some(CloseCode::SessionTimeout);
                }
            }
        }
    };

    if let Some(code) = close_code {
        tracing::debug!(session_id = %session_id, close_code = %code, "Closing connection");
        connection.close(code).await;
    }

    // Dropping the connection drops its sender and change subscriptions
    drop(connection);
    if tokio::time::timeout(SEND_DRAIN_TIMEOUT, send_task).await.is_err() {
        tracing::debug!(session_id = %session_id, "Send task did not drain in time");
    }

    state.connection_manager().remove_connection(&session_id);
    tracing::info!(session_id = %session_id, "Connection cleaned up");
}

/// Handle a text frame. `Err` closes the socket with that code.
async fn handle_text_message(
    state: &GatewayState,
    connection: &mut Connection,
    text: &str,
) -> Result<(), CloseCode> {
    let message = match GatewayMessage::from_json(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(
                session_id = %connection.session_id(),
                error = %e,
                "Failed to parse message"
            );
            return Err(CloseCode::DecodeError);
        }
    };

    tracing::trace!(
        session_id = %connection.session_id(),
        op = %message.op,
        "Received message"
    );

    match MessageDispatcher::dispatch(state, connection, message).await {
        Ok(Some(close_code)) => Err(close_code),
        Ok(None) => Ok(()),
        Err(e) => report(connection, e).await,
    }
}

async fn report(connection: &mut Connection, error: HandlerError) -> Result<(), CloseCode> {
    tracing::warn!(
        session_id = %connection.session_id(),
        error = %error,
        "Handler error"
    );
    match error.to_close_code() {
        Some(code) => Err(code),
        None => {
            let event = ErrorEvent {
                code: error.error_code().to_string(),
                message: error.to_string(),
            };
            connection.dispatch(GatewayEventType::Error, &event).await;
            Ok(())
        }
    }
}
