//! Path parameter extractors

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;

use crate::response::ApiError;

/// A single UUID path segment, rejected with a JSON 400 instead of axum's plain text
#[derive(Debug, Clone, Copy)]
pub struct UuidPath(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for UuidPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_path(e.to_string()))?;

        raw.parse::<Uuid>()
            .map(UuidPath)
            .map_err(|_| ApiError::invalid_path(format!("'{raw}' is not a valid id")))
    }
}
