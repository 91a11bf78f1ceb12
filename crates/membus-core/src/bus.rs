//! The in-process message bus: registration and lifecycle.
//!
//! `MemoryBus` owns four independent registry tables, one per
//! [`EntryKind`]. Registration calls build an entry, append it to the table
//! under the route derived from the generic type arguments, and hand back a
//! [`SubscriptionHandle`] bound to that exact entry. Dispatch lives in
//! [`dispatch`](crate::dispatch).
//!
//! The bus needs no external synchronisation: share it behind an `Arc` and
//! call it from any thread or task.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use membus_types::{BusConfig, BusError};
use tracing::debug;

use crate::Message;
use crate::entry::{
    AsyncResponderEntry, AsyncSubscriberEntry, EntryKind, Filter, ResponderEntry,
    SubscriberEntry,
};
use crate::handle::SubscriptionHandle;
use crate::registry::{StoredEntry, Table};
use crate::route::{RouteKey, route_name};

/// In-process typed publish/subscribe and request/respond bus.
pub struct MemoryBus {
    config: BusConfig,
    pub(crate) subscribers: Arc<Table>,
    pub(crate) async_subscribers: Arc<Table>,
    pub(crate) responders: Arc<Table>,
    pub(crate) async_responders: Arc<Table>,
    disposed: AtomicBool,
}

impl MemoryBus {
    /// Create an empty bus with the given configuration.
    pub fn new(config: BusConfig) -> Self {
        Self {
            config,
            subscribers: Arc::new(Table::new(EntryKind::Subscriber)),
            async_subscribers: Arc::new(Table::new(EntryKind::AsyncSubscriber)),
            responders: Arc::new(Table::new(EntryKind::Responder)),
            async_responders: Arc::new(Table::new(EntryKind::AsyncResponder)),
            disposed: AtomicBool::new(false),
        }
    }

    /// The configuration this bus was built with.
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Publish/subscribe registration
    // -----------------------------------------------------------------------

    /// Register a synchronous subscriber for every `M` published.
    pub fn subscribe<M, F>(&self, handler: F) -> Result<SubscriptionHandle, BusError>
    where
        M: Message,
        F: Fn(&M) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let entry = SubscriberEntry::<M>::subscriber(handler, None);
        self.register::<M>(&self.subscribers, RouteKey::message::<M>(), Arc::new(entry))
    }

    /// Register a synchronous subscriber that only sees `M`s passing `filter`.
    pub fn subscribe_filtered<M, F, P>(
        &self,
        handler: F,
        filter: P,
    ) -> Result<SubscriptionHandle, BusError>
    where
        M: Message,
        F: Fn(&M) -> anyhow::Result<()> + Send + Sync + 'static,
        P: Fn(&M) -> bool + Send + Sync + 'static,
    {
        let entry = SubscriberEntry::<M>::subscriber(handler, Some(boxed_filter(filter)));
        self.register::<M>(&self.subscribers, RouteKey::message::<M>(), Arc::new(entry))
    }

    /// Register an asynchronous subscriber for every `M` published with
    /// [`publish_async`](Self::publish_async).
    pub fn subscribe_async<M, F, Fut>(&self, handler: F) -> Result<SubscriptionHandle, BusError>
    where
        M: Message + Clone,
        F: Fn(M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let entry = AsyncSubscriberEntry::<M>::async_subscriber(handler, None);
        self.register::<M>(
            &self.async_subscribers,
            RouteKey::message::<M>(),
            Arc::new(entry),
        )
    }

    /// Filtered variant of [`subscribe_async`](Self::subscribe_async).
    pub fn subscribe_async_filtered<M, F, Fut, P>(
        &self,
        handler: F,
        filter: P,
    ) -> Result<SubscriptionHandle, BusError>
    where
        M: Message + Clone,
        F: Fn(M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
        P: Fn(&M) -> bool + Send + Sync + 'static,
    {
        let entry =
            AsyncSubscriberEntry::<M>::async_subscriber(handler, Some(boxed_filter(filter)));
        self.register::<M>(
            &self.async_subscribers,
            RouteKey::message::<M>(),
            Arc::new(entry),
        )
    }

    // -----------------------------------------------------------------------
    // Request/respond registration
    // -----------------------------------------------------------------------

    /// Register a synchronous responder answering `Q` with `R`.
    pub fn respond<Q, R, F>(&self, handler: F) -> Result<SubscriptionHandle, BusError>
    where
        Q: Message,
        R: Send + 'static,
        F: Fn(&Q) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        let entry = ResponderEntry::<Q, R>::responder(handler, None);
        self.register::<Q>(&self.responders, RouteKey::request::<Q, R>(), Arc::new(entry))
    }

    /// Register a synchronous responder that only answers requests passing `filter`.
    pub fn respond_filtered<Q, R, F, P>(
        &self,
        handler: F,
        filter: P,
    ) -> Result<SubscriptionHandle, BusError>
    where
        Q: Message,
        R: Send + 'static,
        F: Fn(&Q) -> anyhow::Result<R> + Send + Sync + 'static,
        P: Fn(&Q) -> bool + Send + Sync + 'static,
    {
        let entry = ResponderEntry::<Q, R>::responder(handler, Some(boxed_filter(filter)));
        self.register::<Q>(&self.responders, RouteKey::request::<Q, R>(), Arc::new(entry))
    }

    /// Register an asynchronous responder answering `Q` with `R`.
    pub fn respond_async<Q, R, F, Fut>(&self, handler: F) -> Result<SubscriptionHandle, BusError>
    where
        Q: Message,
        R: Send + 'static,
        F: Fn(Q) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        let entry = AsyncResponderEntry::<Q, R>::async_responder(handler, None);
        self.register::<Q>(
            &self.async_responders,
            RouteKey::request::<Q, R>(),
            Arc::new(entry),
        )
    }

    /// Filtered variant of [`respond_async`](Self::respond_async).
    pub fn respond_async_filtered<Q, R, F, Fut, P>(
        &self,
        handler: F,
        filter: P,
    ) -> Result<SubscriptionHandle, BusError>
    where
        Q: Message,
        R: Send + 'static,
        F: Fn(Q) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        P: Fn(&Q) -> bool + Send + Sync + 'static,
    {
        let entry =
            AsyncResponderEntry::<Q, R>::async_responder(handler, Some(boxed_filter(filter)));
        self.register::<Q>(
            &self.async_responders,
            RouteKey::request::<Q, R>(),
            Arc::new(entry),
        )
    }

    /// Insert `entry` and build the handle that removes it again.
    ///
    /// `M` is the message (or request) type, used for diagnostics.
    fn register<M: 'static>(
        &self,
        table: &Arc<Table>,
        key: RouteKey,
        entry: StoredEntry,
    ) -> Result<SubscriptionHandle, BusError> {
        if self.is_disposed() {
            return Err(BusError::Disposed);
        }

        let route = route_name::<M>();
        let id = table
            .insert(key, entry, self.config.max_entries_per_route)
            .map_err(|full| BusError::RouteFull {
                route,
                limit: full.limit,
            })?;

        let kind = table.kind();
        debug!(bus = %self.config.name, %kind, route, %id, "registered entry");

        let weak = Arc::downgrade(table);
        let bus = self.config.name.clone();
        Ok(SubscriptionHandle::new(id, move || {
            // The table is gone once the bus is dropped; nothing left to remove.
            let Some(table) = weak.upgrade() else {
                return;
            };
            if table.remove(&key, id) {
                debug!(%bus, %kind, route, %id, "removed entry");
            } else {
                debug!(%bus, %kind, route, %id, "entry already removed");
            }
        }))
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Number of synchronous subscribers registered for `M`.
    pub fn subscriber_count<M: Message>(&self) -> usize {
        self.subscribers.len(&RouteKey::message::<M>())
    }

    /// Number of asynchronous subscribers registered for `M`.
    pub fn async_subscriber_count<M: Message>(&self) -> usize {
        self.async_subscribers.len(&RouteKey::message::<M>())
    }

    /// Number of synchronous responders registered for `Q -> R`.
    pub fn responder_count<Q: Message, R: 'static>(&self) -> usize {
        self.responders.len(&RouteKey::request::<Q, R>())
    }

    /// Number of asynchronous responders registered for `Q -> R`.
    pub fn async_responder_count<Q: Message, R: 'static>(&self) -> usize {
        self.async_responders.len(&RouteKey::request::<Q, R>())
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Clear every table. Idempotent; later calls are no-ops.
    ///
    /// After disposal, publish and request calls report no subscribers or
    /// responders, registration fails with [`BusError::Disposed`], and
    /// outstanding handles dispose as no-ops.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        for table in self.tables() {
            table.clear();
        }
        debug!(bus = %self.config.name, "disposed bus");
    }

    pub(crate) fn tables(&self) -> [&Table; 4] {
        [
            &*self.subscribers,
            &*self.async_subscribers,
            &*self.responders,
            &*self.async_responders,
        ]
    }
}

fn boxed_filter<M, P>(filter: P) -> Filter<M>
where
    P: Fn(&M) -> bool + Send + Sync + 'static,
{
    Box::new(filter)
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

impl Drop for MemoryBus {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for MemoryBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBus")
            .field("name", &self.config.name)
            .field("subscribers", &self.subscribers)
            .field("async_subscribers", &self.async_subscribers)
            .field("responders", &self.responders)
            .field("async_responders", &self.async_responders)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
