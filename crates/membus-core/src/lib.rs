//! In-process typed message bus for membus.
//!
//! Producers and consumers meet on [`MemoryBus`] by message type alone:
//! - **Publish/subscribe:** fire-and-forget fan-out to every matching
//!   subscriber, synchronous ([`MemoryBus::publish`]) or asynchronous
//!   ([`MemoryBus::publish_async`]).
//! - **Request/respond:** exactly one matching responder answers each
//!   request ([`MemoryBus::request`], [`MemoryBus::request_async`]).
//!
//! Every registration returns a [`SubscriptionHandle`] that removes just
//! that registration when disposed.

pub mod bus;
pub mod config;
mod dispatch;
pub mod entry;
pub mod handle;
mod registry;
pub mod route;

use std::any::Any;

pub use bus::MemoryBus;
pub use config::load_bus_config;
pub use entry::EntryKind;
pub use handle::SubscriptionHandle;
pub use membus_types::{BusConfig, BusError};
pub use registry::EntryId;
pub use route::RouteKey;

/// Marker for types that can travel over the bus.
///
/// Implemented for every `'static + Send + Sync` type.
pub trait Message: Any + Send + Sync {}

impl<T: Any + Send + Sync> Message for T {}
