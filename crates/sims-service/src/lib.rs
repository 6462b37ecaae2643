//! # sims-service
//!
//! Application layer containing business logic, services, and DTOs.

pub mod dto;
pub mod gateway;
pub mod services;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
