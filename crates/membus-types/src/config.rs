//! Bus configuration types.
//!
//! `BusConfig` is handed to `MemoryBus::new` and is typically loaded from a
//! `membus.toml` file. All fields have defaults, so an empty file is valid.

use serde::{Deserialize, Serialize};

/// Construction-time configuration for a memory bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Name attached to every log event emitted by the bus.
    #[serde(default = "default_name")]
    pub name: String,

    /// Upper bound on entries registered under a single routing key.
    ///
    /// `None` (the default) means unbounded. When set, a subscribe or respond
    /// call that would exceed the bound is rejected.
    #[serde(default)]
    pub max_entries_per_route: Option<usize>,
}

fn default_name() -> String {
    "membus".to_string()
}

impl BusConfig {
    /// Create a config with the given bus name and default limits.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the per-route entry limit.
    pub fn with_max_entries_per_route(mut self, limit: usize) -> Self {
        self.max_entries_per_route = Some(limit);
        self
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            max_entries_per_route: None,
        }
    }
}
