//! Model to entity mappers
//!
//! - `From<Model> for Entity` when every column maps directly
//! - `TryFrom<Model> for Entity` when a text column holds a closed enum;
//!   unknown values surface as `DatabaseError` rather than panicking

mod credential;
mod friendship;
mod invite;
mod notification;
mod post;
mod profile;
mod push_subscription;

pub use friendship::friendship_status_from_str;
