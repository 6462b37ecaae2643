//! Connection management
//!
//! Per-socket state and the registry of live sockets.

mod connection;
mod manager;

pub use connection::{Change, Connection, Outbound};
pub use manager::ConnectionManager;
