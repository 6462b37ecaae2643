//! Axum extractors for request handling
//!
//! Custom extractors for authentication, the invite gate, validation, and pagination.

mod auth;
mod pagination;
mod path;
mod validated;

pub use auth::{ApprovedUser, AuthUser};
pub use pagination::{Pagination, PaginationParams};
pub use path::UuidPath;
pub use validated::ValidatedJson;
