//! Gateway events
//!
//! Defines all dispatch events sent by the gateway to clients.

mod event_types;
mod payloads;

pub use event_types::GatewayEventType;
pub use payloads::{
    ErrorEvent, NewPostsEvent, PageEvent, PostsMergedEvent, ProfileUpdatedEvent, ReadyEvent,
};
