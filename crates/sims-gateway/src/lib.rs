//! # sims-gateway
//!
//! WebSocket gateway delivering the live feed to signed-in clients.

pub mod connection;
pub mod events;
pub mod handlers;
pub mod protocol;
pub mod server;

pub use server::{create_app, create_gateway_state, run, GatewayState};
