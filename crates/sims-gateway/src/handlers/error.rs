//! Handler error types

use crate::protocol::CloseCode;
use sims_core::InviteState;
use sims_service::services::ServiceError;
use thiserror::Error;

/// Handler error type
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Invalid payload received
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Feed op sent before Identify
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Identified, but the invite is not approved
    #[error("Invite not approved (status: {})", .0.as_str())]
    InvitePending(InviteState),

    /// Service error
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),
}

impl HandlerError {
    /// Close code for errors that end the connection. `None` means the
    /// client gets an ERROR event and the socket stays open.
    pub fn to_close_code(&self) -> Option<CloseCode> {
        match self {
            Self::InvalidPayload(_) => Some(CloseCode::DecodeError),
            Self::AuthenticationFailed(_) => Some(CloseCode::AuthenticationFailed),
            Self::NotAuthenticated => Some(CloseCode::NotAuthenticated),
            Self::InvitePending(_) => Some(CloseCode::InvitePending),
            Self::Service(_) => None,
        }
    }

    pub fn error_code(&self) -> &str {
        match self {
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::InvitePending(_) => "INVITE_PENDING",
            Self::Service(e) => e.error_code(),
        }
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
