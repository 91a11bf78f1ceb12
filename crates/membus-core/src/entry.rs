//! Registered handler records.
//!
//! An entry is plain data: an optional filter plus the handler to run. It has
//! no knowledge of how it is unregistered -- that lives in
//! [`SubscriptionHandle`](crate::handle::SubscriptionHandle).

use std::fmt;
use std::future::Future;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

/// Predicate deciding whether an entry sees a given message.
pub(crate) type Filter<M> = Box<dyn Fn(&M) -> bool + Send + Sync>;

/// The four registration kinds, one table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Subscriber,
    AsyncSubscriber,
    Responder,
    AsyncResponder,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Subscriber => "subscriber",
            EntryKind::AsyncSubscriber => "async_subscriber",
            EntryKind::Responder => "responder",
            EntryKind::AsyncResponder => "async_responder",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handler of type `H` guarded by an optional filter over `M`.
pub(crate) struct Entry<M, H: ?Sized> {
    filter: Option<Filter<M>>,
    handler: Box<H>,
}

impl<M, H: ?Sized> Entry<M, H> {
    /// Whether the filter passes. A missing filter always passes.
    pub(crate) fn accepts(&self, message: &M) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter(message))
    }
}

pub(crate) type SubscriberEntry<M> = Entry<M, dyn Fn(&M) -> anyhow::Result<()> + Send + Sync>;

pub(crate) type AsyncSubscriberEntry<M> =
    Entry<M, dyn Fn(M) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

pub(crate) type ResponderEntry<Q, R> = Entry<Q, dyn Fn(&Q) -> anyhow::Result<R> + Send + Sync>;

pub(crate) type AsyncResponderEntry<Q, R> =
    Entry<Q, dyn Fn(Q) -> BoxFuture<'static, anyhow::Result<R>> + Send + Sync>;

impl<M: 'static> SubscriberEntry<M> {
    pub(crate) fn subscriber<F>(handler: F, filter: Option<Filter<M>>) -> Self
    where
        F: Fn(&M) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            filter,
            handler: Box::new(handler),
        }
    }

    pub(crate) fn deliver(&self, message: &M) -> anyhow::Result<()> {
        (self.handler)(message)
    }
}

impl<M: 'static> AsyncSubscriberEntry<M> {
    pub(crate) fn async_subscriber<F, Fut>(handler: F, filter: Option<Filter<M>>) -> Self
    where
        F: Fn(M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            filter,
            handler: Box::new(move |message| handler(message).boxed()),
        }
    }

    pub(crate) fn deliver_async(&self, message: M) -> BoxFuture<'static, anyhow::Result<()>> {
        (self.handler)(message)
    }
}

impl<Q: 'static, R: 'static> ResponderEntry<Q, R> {
    pub(crate) fn responder<F>(handler: F, filter: Option<Filter<Q>>) -> Self
    where
        F: Fn(&Q) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        Self {
            filter,
            handler: Box::new(handler),
        }
    }

    pub(crate) fn respond(&self, request: &Q) -> anyhow::Result<R> {
        (self.handler)(request)
    }
}

impl<Q: 'static, R: 'static> AsyncResponderEntry<Q, R> {
    pub(crate) fn async_responder<F, Fut>(handler: F, filter: Option<Filter<Q>>) -> Self
    where
        F: Fn(Q) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        Self {
            filter,
            handler: Box::new(move |request| handler(request).boxed()),
        }
    }

    pub(crate) fn respond_async(&self, request: Q) -> BoxFuture<'static, anyhow::Result<R>> {
        (self.handler)(request)
    }
}
