use thiserror::Error;

/// Errors surfaced by bus operations.
///
/// Type names are carried for diagnostics only; routing never compares them.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("no subscribers registered for {message}")]
    NoSubscribers { message: &'static str },

    #[error("no responders registered for {request} -> {response}")]
    NoResponders {
        request: &'static str,
        response: &'static str,
    },

    #[error("no responder accepted {request} -> {response}")]
    NoMatchingResponder {
        request: &'static str,
        response: &'static str,
    },

    #[error("{matches} responders accepted {request} -> {response}, expected exactly one")]
    AmbiguousResponder {
        request: &'static str,
        response: &'static str,
        matches: usize,
    },

    #[error("handler for {route} failed: {source}")]
    Handler {
        route: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("{} async subscriber(s) for {message} failed", .failures.len())]
    AsyncFailures {
        message: &'static str,
        failures: Vec<anyhow::Error>,
    },

    #[error("route {route} is full ({limit} entries)")]
    RouteFull { route: &'static str, limit: usize },

    #[error("bus has been disposed")]
    Disposed,
}

impl BusError {
    /// The individual handler failures behind this error.
    ///
    /// Empty for variants that did not come from a handler.
    pub fn handler_failures(&self) -> Vec<&anyhow::Error> {
        match self {
            BusError::Handler { source, .. } => vec![source],
            BusError::AsyncFailures { failures, .. } => failures.iter().collect(),
            _ => Vec::new(),
        }
    }
}
