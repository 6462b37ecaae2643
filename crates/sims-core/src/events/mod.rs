//! Events emitted when persisted state or auth state changes

mod auth_event;
mod change_event;

pub use auth_event::{AuthEvent, AuthEventKind};
pub use change_event::{ChangeEvent, ChangeKind, Table};
