//! # sims-push
//!
//! Turns notification inserts into browser push messages.
//!
//! The worker follows the notifications change feed. For each insert it looks
//! up the recipient's push subscriptions and sends one message per device
//! through a [`PushTransport`]. A failing device never stops delivery to the
//! others; devices whose endpoint is gone are unregistered.

pub mod delivery;
pub mod message;
pub mod transport;
pub mod worker;

pub use delivery::{DeliveryFailure, DeliveryReport, PushDispatcher};
pub use message::{title_for, PushMessage};
pub use transport::{HttpPushTransport, PushTransport, SendError};
pub use worker::PushWorker;
