//! Pagination extractor
//!
//! Extracts offset-based pagination parameters from query strings.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;
use sims_service::dto::FeedQuery;

use crate::response::ApiError;

/// Maximum page size
const MAX_LIMIT: i64 = 50;

/// Raw pagination query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Checked pagination parameters. A missing limit means "service default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: i64,
}

impl TryFrom<PaginationParams> for Pagination {
    type Error = ApiError;

    fn try_from(params: PaginationParams) -> Result<Self, Self::Error> {
        let offset = params.offset.unwrap_or(0);
        if offset < 0 {
            return Err(ApiError::invalid_query("'offset' must not be negative"));
        }

        Ok(Pagination {
            limit: params.limit.map(|limit| limit.clamp(1, MAX_LIMIT)),
            offset,
        })
    }
}

impl From<Pagination> for FeedQuery {
    fn from(page: Pagination) -> Self {
        FeedQuery {
            limit: page.limit,
            offset: Some(page.offset),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<PaginationParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_query(e.body_text()))?;

        Pagination::try_from(params)
    }
}
