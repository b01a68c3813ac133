//! Keep-alive transfer planner.
//!
//! Builds balanced transfer pairs over a user's active accounts,
//! schedules them across repeated cycles under a strategy's calendar
//! constraints, and persists the result as one batch.

pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod pairing;
pub mod randomizer;
pub mod rng;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod summary;
pub mod types;
