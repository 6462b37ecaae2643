//! Integration test utilities
//!
//! Spawns the REST API and the WebSocket gateway on ephemeral ports, both
//! backed by one in-memory [`TestHarness`](sims_service::testing::TestHarness),
//! so a post made over HTTP shows up on a gateway socket.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
