//! Routing keys derived from message type identity.
//!
//! A `RouteKey` is built from `TypeId`s, so two distinct types never share a
//! key even when their display names collide (same name in different modules,
//! different generic instantiations rendered alike, and so on).

use std::any::{TypeId, type_name};
use std::fmt;

/// Identity of a publish/subscribe or request/respond route.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    message: TypeId,
    response: Option<TypeId>,
}

impl RouteKey {
    /// Key for publish/subscribe traffic of message type `M`.
    pub fn message<M: 'static>() -> Self {
        Self {
            message: TypeId::of::<M>(),
            response: None,
        }
    }

    /// Key for request/respond traffic from `Q` to `R`.
    pub fn request<Q: 'static, R: 'static>() -> Self {
        Self {
            message: TypeId::of::<Q>(),
            response: Some(TypeId::of::<R>()),
        }
    }

    /// Whether this key addresses request/respond traffic.
    pub fn is_request(&self) -> bool {
        self.response.is_some()
    }
}

impl fmt::Debug for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.response {
            Some(response) => write!(f, "RouteKey({:?} -> {:?})", self.message, response),
            None => write!(f, "RouteKey({:?})", self.message),
        }
    }
}

/// Display name of a route, for logs and errors only.
pub(crate) fn route_name<M: 'static>() -> &'static str {
    type_name::<M>()
}
