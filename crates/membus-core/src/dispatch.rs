//! Publish and request dispatch.
//!
//! Every dispatch works on a snapshot of the route taken when the call
//! starts. Handlers may therefore subscribe, unsubscribe or publish again
//! from inside a handler, and an entry removed after the snapshot was taken
//! can still see this one in-flight message.
//!
//! The synchronous and asynchronous publish paths deliberately differ on
//! failure:
//! - `publish` stops at the first failing handler and returns its error.
//! - `publish_async` starts every matching handler, waits for all of them to
//!   settle, then reports every failure together.

use futures_util::future::join_all;
use membus_types::BusError;
use tracing::trace;

use crate::Message;
use crate::bus::MemoryBus;
use crate::entry::{AsyncResponderEntry, AsyncSubscriberEntry, ResponderEntry, SubscriberEntry};
use crate::registry::{StoredEntry, Table};
use crate::route::{RouteKey, route_name};

impl MemoryBus {
    /// Deliver `message` to every matching synchronous subscriber, in
    /// subscription order.
    ///
    /// # Errors
    ///
    /// - [`BusError::NoSubscribers`] if nothing is subscribed to `M`.
    /// - [`BusError::Handler`] with the first handler failure; later
    ///   subscribers are not invoked for this call.
    pub fn publish<M: Message>(&self, message: &M) -> Result<(), BusError> {
        let route = route_name::<M>();
        let entries = self.candidates(&self.subscribers, RouteKey::message::<M>());
        if entries.is_empty() {
            return Err(BusError::NoSubscribers { message: route });
        }
        trace!(bus = %self.config().name, route, candidates = entries.len(), "publish");

        for subscriber in downcast::<SubscriberEntry<M>>(&entries) {
            if subscriber.accepts(message) {
                subscriber
                    .deliver(message)
                    .map_err(|source| BusError::Handler { route, source })?;
            }
        }
        Ok(())
    }

    /// Deliver `message` to every matching asynchronous subscriber
    /// concurrently and wait until all of them have settled.
    ///
    /// Each subscriber receives its own clone of `message`.
    ///
    /// # Errors
    ///
    /// - [`BusError::NoSubscribers`] if nothing is subscribed to `M`.
    /// - [`BusError::AsyncFailures`] carrying every handler failure, raised
    ///   only after the whole fan-out has finished.
    pub async fn publish_async<M: Message + Clone>(&self, message: M) -> Result<(), BusError> {
        let route = route_name::<M>();
        let entries = self.candidates(&self.async_subscribers, RouteKey::message::<M>());
        if entries.is_empty() {
            return Err(BusError::NoSubscribers { message: route });
        }
        trace!(bus = %self.config().name, route, candidates = entries.len(), "publish_async");

        let pending: Vec<_> = downcast::<AsyncSubscriberEntry<M>>(&entries)
            .filter(|subscriber| subscriber.accepts(&message))
            .map(|subscriber| subscriber.deliver_async(message.clone()))
            .collect();

        let failures: Vec<anyhow::Error> = join_all(pending)
            .await
            .into_iter()
            .filter_map(Result::err)
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(BusError::AsyncFailures {
                message: route,
                failures,
            })
        }
    }

    /// Ask the single matching synchronous responder for an `R`.
    ///
    /// # Errors
    ///
    /// - [`BusError::NoResponders`] if no responder is registered for `Q -> R`.
    /// - [`BusError::NoMatchingResponder`] / [`BusError::AmbiguousResponder`]
    ///   unless exactly one responder's filter accepts `request`.
    /// - [`BusError::Handler`] if the responder fails.
    pub fn request<Q: Message, R: Send + 'static>(&self, request: &Q) -> Result<R, BusError> {
        let (request_name, response_name) = (route_name::<Q>(), route_name::<R>());
        let entries = self.candidates(&self.responders, RouteKey::request::<Q, R>());
        if entries.is_empty() {
            return Err(BusError::NoResponders {
                request: request_name,
                response: response_name,
            });
        }
        trace!(
            bus = %self.config().name,
            request = request_name,
            response = response_name,
            candidates = entries.len(),
            "request"
        );

        let responder = sole_match(
            downcast::<ResponderEntry<Q, R>>(&entries).filter(|responder| responder.accepts(request)),
            request_name,
            response_name,
        )?;
        responder.respond(request).map_err(|source| BusError::Handler {
            route: request_name,
            source,
        })
    }

    /// Asynchronous counterpart of [`request`](Self::request), served by
    /// responders registered with [`respond_async`](Self::respond_async).
    ///
    /// # Errors
    ///
    /// Same contract as [`request`](Self::request).
    pub async fn request_async<Q: Message, R: Send + 'static>(
        &self,
        request: Q,
    ) -> Result<R, BusError> {
        let (request_name, response_name) = (route_name::<Q>(), route_name::<R>());
        let entries = self.candidates(&self.async_responders, RouteKey::request::<Q, R>());
        if entries.is_empty() {
            return Err(BusError::NoResponders {
                request: request_name,
                response: response_name,
            });
        }
        trace!(
            bus = %self.config().name,
            request = request_name,
            response = response_name,
            candidates = entries.len(),
            "request_async"
        );

        let responder = sole_match(
            downcast::<AsyncResponderEntry<Q, R>>(&entries)
                .filter(|responder| responder.accepts(&request)),
            request_name,
            response_name,
        )?;
        responder
            .respond_async(request)
            .await
            .map_err(|source| BusError::Handler {
                route: request_name,
                source,
            })
    }

    /// Entries to consider for one dispatch; empty once the bus is disposed.
    fn candidates(&self, table: &Table, key: RouteKey) -> Vec<StoredEntry> {
        if self.is_disposed() {
            return Vec::new();
        }
        table.snapshot(&key)
    }
}

/// Entries of concrete type `T`. Every entry under a route was registered
/// with that route's types, so nothing is skipped in practice.
fn downcast<T: 'static>(entries: &[StoredEntry]) -> impl Iterator<Item = &T> {
    entries.iter().filter_map(|entry| entry.downcast_ref::<T>())
}

/// The only item of `matches`, or the responder-selection error.
fn sole_match<'a, T>(
    mut matches: impl Iterator<Item = &'a T>,
    request: &'static str,
    response: &'static str,
) -> Result<&'a T, BusError> {
    match (matches.next(), matches.next()) {
        (Some(only), None) => Ok(only),
        (None, _) => Err(BusError::NoMatchingResponder { request, response }),
        (Some(_), Some(_)) => Err(BusError::AmbiguousResponder {
            request,
            response,
            matches: 2 + matches.count(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    struct OrderPlaced {
        id: u32,
    }

    #[derive(Debug, Clone)]
    struct Unheard;

    #[derive(Debug, Clone)]
    struct PriceQuery {
        sku: String,
    }

    #[derive(Debug, PartialEq)]
    struct Price(u32);

    fn recorder() -> (Arc<Mutex<Vec<String>>>, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (Arc::clone(&log), log)
    }

    fn entries(log: &Mutex<Vec<String>>) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    // -- publish ------------------------------------------------------------

    #[test]
    fn publish_without_subscribers_fails() {
        let bus = MemoryBus::default();
        let err = bus.publish(&Unheard).unwrap_err();
        assert!(matches!(err, BusError::NoSubscribers { .. }));
    }

    #[test]
    fn publish_invokes_subscribers_in_order_then_respects_disposal() {
        let bus = MemoryBus::default();
        let (log, h1_log) = recorder();
        let h2_log = Arc::clone(&log);

        let h1 = bus
            .subscribe(move |msg: &OrderPlaced| {
                h1_log.lock().unwrap().push(format!("h1:{}", msg.id));
                Ok(())
            })
            .unwrap();
        bus.subscribe(move |msg: &OrderPlaced| {
            h2_log.lock().unwrap().push(format!("h2:{}", msg.id));
            Ok(())
        })
        .unwrap();

        bus.publish(&OrderPlaced { id: 1 }).unwrap();
        assert_eq!(entries(&log), vec!["h1:1", "h2:1"]);

        h1.dispose();
        bus.publish(&OrderPlaced { id: 2 }).unwrap();
        assert_eq!(entries(&log), vec!["h1:1", "h2:1", "h2:2"]);
    }

    #[test]
    fn publish_invokes_each_of_n_subscribers_exactly_once() {
        let bus = MemoryBus::default();
        let calls: Vec<Arc<AtomicUsize>> = (0..5).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        for counter in &calls {
            let counter = Arc::clone(counter);
            bus.subscribe(move |_: &OrderPlaced| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        }

        bus.publish(&OrderPlaced { id: 7 }).unwrap();
        assert!(calls.iter().all(|c| c.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn filter_gates_only_its_own_subscriber() {
        let bus = MemoryBus::default();
        let even = Arc::new(AtomicUsize::new(0));
        let all = Arc::new(AtomicUsize::new(0));

        let even_count = Arc::clone(&even);
        bus.subscribe_filtered(
            move |_: &OrderPlaced| {
                even_count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            |msg: &OrderPlaced| msg.id % 2 == 0,
        )
        .unwrap();
        let all_count = Arc::clone(&all);
        bus.subscribe(move |_: &OrderPlaced| {
            all_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        bus.publish(&OrderPlaced { id: 1 }).unwrap();
        bus.publish(&OrderPlaced { id: 2 }).unwrap();
        bus.publish(&OrderPlaced { id: 3 }).unwrap();

        assert_eq!(even.load(Ordering::SeqCst), 1);
        assert_eq!(all.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn publish_with_no_matching_filter_succeeds() {
        let bus = MemoryBus::default();
        bus.subscribe_filtered(|_: &OrderPlaced| Ok(()), |_: &OrderPlaced| false)
            .unwrap();
        assert!(bus.publish(&OrderPlaced { id: 1 }).is_ok());
    }

    #[test]
    fn publish_fails_fast_on_first_handler_error() {
        let bus = MemoryBus::default();
        let later = Arc::new(AtomicUsize::new(0));

        bus.subscribe(|_: &OrderPlaced| anyhow::bail!("first handler broke"))
            .unwrap();
        let later_count = Arc::clone(&later);
        bus.subscribe(move |_: &OrderPlaced| {
            later_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        let err = bus.publish(&OrderPlaced { id: 1 }).unwrap_err();
        match err {
            BusError::Handler { source, .. } => assert_eq!(source.to_string(), "first handler broke"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn disposing_one_handle_keeps_siblings_registered() {
        let bus = MemoryBus::default();
        let hits = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let hits = Arc::clone(&hits);
                bus.subscribe(move |_: &OrderPlaced| {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap()
            })
            .collect();

        handles[1].dispose();
        bus.publish(&OrderPlaced { id: 1 }).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(bus.subscriber_count::<OrderPlaced>(), 2);
    }

    #[test]
    fn publish_after_last_unsubscribe_reports_no_subscribers() {
        let bus = MemoryBus::default();
        let handle = bus.subscribe(|_: &OrderPlaced| Ok(())).unwrap();
        handle.dispose();

        let err = bus.publish(&OrderPlaced { id: 1 }).unwrap_err();
        assert!(matches!(err, BusError::NoSubscribers { .. }));
    }

    #[test]
    fn sync_and_async_subscribers_are_separate() {
        let bus = MemoryBus::default();
        bus.subscribe_async(|_: OrderPlaced| async { Ok(()) }).unwrap();

        let err = bus.publish(&OrderPlaced { id: 1 }).unwrap_err();
        assert!(matches!(err, BusError::NoSubscribers { .. }));
    }

    #[test]
    fn handler_may_reenter_the_bus() {
        let bus = Arc::new(MemoryBus::default());
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_count = Arc::clone(&seen);
        bus.subscribe(move |_: &Unheard| {
            seen_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        let inner = Arc::clone(&bus);
        bus.subscribe(move |_: &OrderPlaced| {
            inner.subscribe(|_: &OrderPlaced| Ok(()))?;
            inner.publish(&Unheard)?;
            Ok(())
        })
        .unwrap();

        bus.publish(&OrderPlaced { id: 1 }).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count::<OrderPlaced>(), 2);
    }

    #[test]
    fn concurrent_subscribers_are_all_invoked() {
        let bus = MemoryBus::default();
        let hits = Arc::new(AtomicUsize::new(0));
        const THREADS: usize = 32;

        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                let bus = &bus;
                let hits = Arc::clone(&hits);
                scope.spawn(move || {
                    bus.subscribe(move |_: &OrderPlaced| {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .unwrap();
                });
            }
        });

        bus.publish(&OrderPlaced { id: 1 }).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), THREADS);
    }

    // -- publish_async ------------------------------------------------------

    #[tokio::test]
    async fn publish_async_without_subscribers_fails() {
        let bus = MemoryBus::default();
        let err = bus.publish_async(Unheard).await.unwrap_err();
        assert!(matches!(err, BusError::NoSubscribers { .. }));
    }

    #[tokio::test]
    async fn publish_async_runs_all_filtered_subscribers() {
        let bus = MemoryBus::default();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            bus.subscribe_async(move |msg: OrderPlaced| {
                let hits = Arc::clone(&hits);
                async move {
                    hits.fetch_add(msg.id as usize, Ordering::SeqCst);
                    Ok(())
                }
            })
            .unwrap();
        }
        bus.subscribe_async_filtered(
            |_: OrderPlaced| async { anyhow::bail!("filtered out, never runs") },
            |msg: &OrderPlaced| msg.id > 100,
        )
        .unwrap();

        bus.publish_async(OrderPlaced { id: 2 }).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn publish_async_waits_for_all_and_reports_failures() {
        let bus = MemoryBus::default();
        let finished = Arc::new(AtomicUsize::new(0));

        bus.subscribe_async(|_: OrderPlaced| async { anyhow::bail!("boom") })
            .unwrap();
        let slow_finished = Arc::clone(&finished);
        bus.subscribe_async(move |_: OrderPlaced| {
            let finished = Arc::clone(&slow_finished);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .unwrap();

        let err = bus.publish_async(OrderPlaced { id: 1 }).await.unwrap_err();

        // The slow sibling settled before the error surfaced.
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        match err {
            BusError::AsyncFailures { failures, .. } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].to_string(), "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn publish_async_aggregates_every_failure() {
        let bus = MemoryBus::default();
        for label in ["a", "b", "c"] {
            bus.subscribe_async(move |_: OrderPlaced| async move { anyhow::bail!("{label}") })
                .unwrap();
        }

        let err = bus.publish_async(OrderPlaced { id: 1 }).await.unwrap_err();
        let messages: Vec<String> = err
            .handler_failures()
            .iter()
            .map(|failure| failure.to_string())
            .collect();
        assert_eq!(messages, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn publish_async_handlers_run_concurrently() {
        let bus = MemoryBus::default();
        let barrier = Arc::new(tokio::sync::Barrier::new(2));

        for _ in 0..2 {
            let barrier = Arc::clone(&barrier);
            bus.subscribe_async(move |_: OrderPlaced| {
                let barrier = Arc::clone(&barrier);
                async move {
                    // Both handlers must be in flight at once to pass the barrier.
                    barrier.wait().await;
                    Ok(())
                }
            })
            .unwrap();
        }

        tokio::time::timeout(Duration::from_secs(5), bus.publish_async(OrderPlaced { id: 1 }))
            .await
            .expect("fan-out deadlocked")
            .unwrap();
    }

    // -- request ------------------------------------------------------------

    #[test]
    fn request_without_responders_fails() {
        let bus = MemoryBus::default();
        let err = bus
            .request::<PriceQuery, Price>(&PriceQuery { sku: "x".into() })
            .unwrap_err();
        assert!(matches!(err, BusError::NoResponders { .. }));
    }

    #[test]
    fn request_returns_sole_responder_result() {
        let bus = MemoryBus::default();
        bus.respond(|query: &PriceQuery| Ok(Price(query.sku.len() as u32)))
            .unwrap();

        let price: Price = bus.request(&PriceQuery { sku: "abcd".into() }).unwrap();
        assert_eq!(price, Price(4));
    }

    #[test]
    fn request_routes_by_response_type_too() {
        let bus = MemoryBus::default();
        bus.respond(|_: &PriceQuery| Ok(Price(1))).unwrap();
        bus.respond(|_: &PriceQuery| Ok("one".to_string())).unwrap();

        let query = PriceQuery { sku: "a".into() };
        assert_eq!(bus.request::<_, Price>(&query).unwrap(), Price(1));
        assert_eq!(bus.request::<_, String>(&query).unwrap(), "one");
    }

    #[test]
    fn request_with_no_matching_filter_fails() {
        let bus = MemoryBus::default();
        bus.respond_filtered(
            |_: &PriceQuery| Ok(Price(1)),
            |query: &PriceQuery| query.sku == "known",
        )
        .unwrap();

        let err = bus
            .request::<_, Price>(&PriceQuery { sku: "other".into() })
            .unwrap_err();
        assert!(matches!(err, BusError::NoMatchingResponder { .. }));
    }

    #[test]
    fn request_with_two_matching_responders_is_ambiguous() {
        let bus = MemoryBus::default();
        bus.respond_filtered(
            |_: &PriceQuery| Ok(Price(1)),
            |query: &PriceQuery| query.sku.starts_with('a'),
        )
        .unwrap();
        bus.respond_filtered(
            |_: &PriceQuery| Ok(Price(2)),
            |query: &PriceQuery| query.sku.ends_with('z'),
        )
        .unwrap();

        let err = bus
            .request::<_, Price>(&PriceQuery { sku: "az".into() })
            .unwrap_err();
        assert!(matches!(err, BusError::AmbiguousResponder { matches: 2, .. }));

        // Disjoint inputs each pick exactly one.
        assert_eq!(bus.request::<_, Price>(&PriceQuery { sku: "ab".into() }).unwrap(), Price(1));
        assert_eq!(bus.request::<_, Price>(&PriceQuery { sku: "bz".into() }).unwrap(), Price(2));
    }

    #[test]
    fn request_propagates_responder_failure() {
        let bus = MemoryBus::default();
        bus.respond(|_: &PriceQuery| -> anyhow::Result<Price> { anyhow::bail!("catalog offline") })
            .unwrap();

        let err = bus
            .request::<_, Price>(&PriceQuery { sku: "a".into() })
            .unwrap_err();
        assert!(matches!(err, BusError::Handler { .. }));
        assert!(err.to_string().contains("catalog offline"));
    }

    #[test]
    fn disposed_responder_is_no_longer_selected() {
        let bus = MemoryBus::default();
        let first = bus.respond(|_: &PriceQuery| Ok(Price(1))).unwrap();
        bus.respond(|_: &PriceQuery| Ok(Price(2))).unwrap();

        let query = PriceQuery { sku: "a".into() };
        assert!(matches!(
            bus.request::<_, Price>(&query),
            Err(BusError::AmbiguousResponder { .. })
        ));

        first.dispose();
        assert_eq!(bus.request::<_, Price>(&query).unwrap(), Price(2));
    }

    // -- request_async ------------------------------------------------------

    #[tokio::test]
    async fn request_async_returns_sole_responder_result() {
        let bus = MemoryBus::default();
        bus.respond_async(|query: PriceQuery| async move { Ok(Price(query.sku.len() as u32 * 10)) })
            .unwrap();

        let price: Price = bus
            .request_async(PriceQuery { sku: "abc".into() })
            .await
            .unwrap();
        assert_eq!(price, Price(30));
    }

    #[tokio::test]
    async fn request_async_does_not_see_sync_responders() {
        let bus = MemoryBus::default();
        bus.respond(|_: &PriceQuery| Ok(Price(1))).unwrap();

        let err = bus
            .request_async::<_, Price>(PriceQuery { sku: "a".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::NoResponders { .. }));
    }

    #[tokio::test]
    async fn request_async_enforces_single_match() {
        let bus = MemoryBus::default();
        bus.respond_async_filtered(
            |_: PriceQuery| async { Ok(Price(1)) },
            |query: &PriceQuery| query.sku.len() < 3,
        )
        .unwrap();
        bus.respond_async_filtered(
            |_: PriceQuery| async { Ok(Price(2)) },
            |query: &PriceQuery| query.sku.len() > 1,
        )
        .unwrap();

        let only_first = bus
            .request_async::<_, Price>(PriceQuery { sku: String::new() })
            .await
            .unwrap();
        assert_eq!(only_first, Price(1));

        let ambiguous = bus
            .request_async::<_, Price>(PriceQuery { sku: "ab".into() })
            .await
            .unwrap_err();
        assert!(matches!(ambiguous, BusError::AmbiguousResponder { matches: 2, .. }));

        let only_second = bus
            .request_async::<_, Price>(PriceQuery { sku: "abcd".into() })
            .await
            .unwrap();
        assert_eq!(only_second, Price(2));
    }

    #[tokio::test]
    async fn request_async_with_no_matching_filter_fails() {
        let bus = MemoryBus::default();
        bus.respond_async_filtered(|_: PriceQuery| async { Ok(Price(1)) }, |_: &PriceQuery| false)
            .unwrap();

        let err = bus
            .request_async::<_, Price>(PriceQuery { sku: "a".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::NoMatchingResponder { .. }));
    }

    #[tokio::test]
    async fn request_async_propagates_responder_failure() {
        let bus = MemoryBus::default();
        bus.respond_async::<PriceQuery, Price, _, _>(|_| async { anyhow::bail!("timeout upstream") })
            .unwrap();

        let err = bus
            .request_async::<_, Price>(PriceQuery { sku: "a".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::Handler { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tasks_subscribe_then_publish_async() {
        let bus = Arc::new(MemoryBus::default());
        let hits = Arc::new(AtomicUsize::new(0));
        const TASKS: usize = 64;

        let mut joins = Vec::new();
        for _ in 0..TASKS {
            let bus = Arc::clone(&bus);
            let hits = Arc::clone(&hits);
            joins.push(tokio::spawn(async move {
                bus.subscribe_async(move |_: OrderPlaced| {
                    let hits = Arc::clone(&hits);
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                })
                .unwrap()
            }));
        }
        for join in joins {
            join.await.unwrap();
        }

        bus.publish_async(OrderPlaced { id: 1 }).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), TASKS);
    }
}
