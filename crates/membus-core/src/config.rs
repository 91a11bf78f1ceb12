//! Bus configuration loader.
//!
//! Reads a TOML file and deserializes it into [`BusConfig`]. Falls back to
//! defaults when the file is missing or malformed, so a bus can always be
//! constructed.

use std::path::Path;

use membus_types::BusConfig;

/// Load bus configuration from `path`.
///
/// - If the file does not exist, returns [`BusConfig::default()`].
/// - If the file cannot be read or parsed, logs a warning and returns the default.
/// - Otherwise returns the parsed config.
pub async fn load_bus_config(path: &Path) -> BusConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No bus config at {}, using defaults", path.display());
            return BusConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return BusConfig::default();
        }
    };

    match toml::from_str::<BusConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            BusConfig::default()
        }
    }
}
