//! Service layer error type shared by every use case

use sims_common::AppError;
use sims_core::{DomainError, InviteState};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Signed in, but the invite gate has not opened yet
    #[error("Invite not approved yet (status: {})", .status.as_str())]
    InvitePending { status: InviteState },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied(reason.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status this error surfaces as
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Domain(e) if e.is_not_found() => 404,
            Self::Domain(e) if e.is_authentication() => 401,
            Self::Domain(e) if e.is_authorization() => 403,
            Self::Domain(e) if e.is_validation() => 400,
            Self::Domain(e) if e.is_conflict() => 409,
            Self::Domain(_) => 500,
            Self::App(e) => e.status_code(),
            Self::NotFound { .. } => 404,
            Self::PermissionDenied(_) | Self::InvitePending { .. } => 403,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// Stable code for API error bodies
    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::App(e) => e.error_code(),
            Self::NotFound { .. } => "NOT_FOUND",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::InvitePending { .. } => "INVITE_PENDING",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => AppError::Domain(e),
            ServiceError::App(e) => e,
            ServiceError::NotFound { resource, id } => {
                AppError::NotFound(format!("{resource} {id}"))
            }
            ServiceError::PermissionDenied(_) | ServiceError::InvitePending { .. } => {
                AppError::InsufficientPermissions
            }
            ServiceError::Validation(msg) => AppError::Validation(msg),
            ServiceError::Conflict(msg) => AppError::Conflict(msg),
            ServiceError::Internal(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = ServiceError::not_found("Profile", "123");
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(err.to_string().contains("Profile not found: 123"));
    }

    #[test]
    fn test_invite_pending_error() {
        let err = ServiceError::InvitePending {
            status: InviteState::Pending,
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "INVITE_PENDING");
        assert!(err.to_string().contains("pending"));
    }

    #[test]
    fn test_domain_error_mapping() {
        let err = ServiceError::from(DomainError::InvalidCredentials);
        assert_eq!(err.status_code(), 401);

        let err = ServiceError::from(DomainError::NotAdmin);
        assert_eq!(err.status_code(), 403);

        let err = ServiceError::from(DomainError::TagAlreadyChanged);
        assert_eq!(err.status_code(), 400);

        let err = ServiceError::from(DomainError::UsernameTaken("bella".into()));
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "USERNAME_TAKEN");
    }

    #[test]
    fn test_domain_errors_display_transparently() {
        let err = ServiceError::from(DomainError::NotAdmin);
        assert_eq!(err.to_string(), DomainError::NotAdmin.to_string());
    }

    #[test]
    fn test_conflict_error() {
        let err = ServiceError::conflict("Email already exists");
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "CONFLICT");
    }

    #[test]
    fn test_convert_to_app_error() {
        let service_err = ServiceError::not_found("Post", "456");
        let app_err: AppError = service_err.into();
        assert_eq!(app_err.status_code(), 404);
    }
}
