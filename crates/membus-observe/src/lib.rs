//! Observability setup for membus processes.
//!
//! The bus itself only emits `tracing` events; installing a subscriber is the
//! embedding process's job. This crate provides the standard one.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, shutdown_tracing};
