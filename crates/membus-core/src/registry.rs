//! Concurrency-safe storage of registered entries, keyed by route.
//!
//! Each table maps a [`RouteKey`] to its own [`Route`], and every route owns
//! the lock guarding its entry list. Mutating one route never blocks another
//! beyond the brief map-shard access needed to find it.
//!
//! Routes are never dropped from the map by single-entry removal: an emptied
//! route stays behind, so a concurrent insert can never append into a list
//! that has already been unlinked. Only [`Table::clear`] (bus disposal)
//! removes routes.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use uuid::Uuid;

use crate::entry::EntryKind;
use crate::route::RouteKey;

/// Type-erased entry as stored in a table.
pub(crate) type StoredEntry = Arc<dyn Any + Send + Sync>;

/// Unique id of a registered entry.
pub type EntryId = Uuid;

/// A single registration slot inside a route.
struct Slot {
    id: EntryId,
    entry: StoredEntry,
}

/// The ordered entries registered under one routing key.
#[derive(Default)]
struct Route {
    slots: RwLock<Vec<Slot>>,
}

/// Why an insert was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RouteFull {
    pub limit: usize,
}

/// One registry table (one per [`EntryKind`]).
pub(crate) struct Table {
    kind: EntryKind,
    routes: DashMap<RouteKey, Arc<Route>>,
    entries: AtomicUsize,
}

impl Table {
    pub(crate) fn new(kind: EntryKind) -> Self {
        Self {
            kind,
            routes: DashMap::new(),
            entries: AtomicUsize::new(0),
        }
    }

    pub(crate) fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Append `entry` under `key`, creating the route on first use.
    ///
    /// `limit` caps the number of live entries under this key; the check and
    /// the append happen under the same route lock.
    pub(crate) fn insert(
        &self,
        key: RouteKey,
        entry: StoredEntry,
        limit: Option<usize>,
    ) -> Result<EntryId, RouteFull> {
        // Clone the Arc out so the shard lock is released before the route lock is taken.
        let route = Arc::clone(self.routes.entry(key).or_default().value());

        let mut slots = route.slots.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(limit) = limit {
            if slots.len() >= limit {
                return Err(RouteFull { limit });
            }
        }

        let id = Uuid::now_v7();
        slots.push(Slot { id, entry });
        self.entries.fetch_add(1, Ordering::Relaxed);
        Ok(id)
    }

    /// Remove exactly the entry `id` from `key`, leaving its siblings intact.
    ///
    /// Returns `false` when the entry is already gone (removed earlier or
    /// cleared by disposal).
    pub(crate) fn remove(&self, key: &RouteKey, id: EntryId) -> bool {
        let Some(route) = self.routes.get(key).map(|route| Arc::clone(route.value())) else {
            return false;
        };

        let mut slots = route.slots.write().unwrap_or_else(PoisonError::into_inner);
        match slots.iter().position(|slot| slot.id == id) {
            Some(index) => {
                slots.remove(index);
                self.entries.fetch_sub(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the entries under `key`, in insertion order.
    ///
    /// The snapshot is detached from the table: entries inserted or removed
    /// after this call do not affect it.
    pub(crate) fn snapshot(&self, key: &RouteKey) -> Vec<StoredEntry> {
        let Some(route) = self.routes.get(key).map(|route| Arc::clone(route.value())) else {
            return Vec::new();
        };

        let slots = route.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.iter().map(|slot| Arc::clone(&slot.entry)).collect()
    }

    /// Number of live entries under `key`.
    pub(crate) fn len(&self, key: &RouteKey) -> usize {
        self.routes
            .get(key)
            .map(|route| route.slots.read().unwrap_or_else(PoisonError::into_inner).len())
            .unwrap_or(0)
    }

    /// Number of routes that currently hold at least one entry.
    pub(crate) fn route_count(&self) -> usize {
        self.routes
            .iter()
            .filter(|route| {
                !route
                    .slots
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_empty()
            })
            .count()
    }

    /// Total live entries across all routes.
    pub(crate) fn entry_count(&self) -> usize {
        self.entries.load(Ordering::Relaxed)
    }

    /// Drop every route and entry.
    pub(crate) fn clear(&self) {
        self.routes.clear();
        self.entries.store(0, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("kind", &self.kind)
            .field("routes", &self.route_count())
            .field("entries", &self.entry_count())
            .finish()
    }
}
