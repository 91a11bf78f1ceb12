//! Shared types for membus.
//!
//! This crate holds the pieces every layer of the bus agrees on:
//! the construction-time [`config::BusConfig`] and the [`error::BusError`]
//! kinds surfaced by publish, request and registration calls.
//!
//! Zero runtime dependencies -- only serde, thiserror and anyhow.

pub mod config;
pub mod error;

pub use config::BusConfig;
pub use error::BusError;
