//! Snapshot reader for the plugin's persisted configuration.
//!
//! The config document is owned by the plugin's web UI; the installer only
//! reads it, once, at install time. Loading never fails: a missing file,
//! malformed JSON, or an absent/null/mistyped key falls back to the
//! documented default for that key.

use pkg_constants::service::DEFAULT_IDLE_TIMEOUT;
use std::path::Path;
use tracing::warn;

/// Install-time snapshot of the plugin configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RuntimeConfig {
    /// Seconds of inactivity before the compositor may blank the display.
    pub idle_timeout: u64,
    /// Whether the compositor service should be started right after install.
    pub enabled: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            enabled: true,
        }
    }
}

impl RuntimeConfig {
    /// Read a snapshot from `path`, defaulting each key independently.
    pub fn load(path: &Path) -> Self {
        let data = match std::fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) => {
                warn!(
                    "config {} not readable ({}), using defaults",
                    path.display(),
                    e
                );
                return Self::default();
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&data) {
            Ok(v) => v,
            Err(e) => {
                warn!("config {} is not valid JSON ({}), using defaults", path.display(), e);
                return Self::default();
            }
        };

        let defaults = Self::default();
        Self {
            idle_timeout: value
                .get("idle_timeout")
                .and_then(|v| v.as_u64())
                .unwrap_or(defaults.idle_timeout),
            enabled: value
                .get("enabled")
                .and_then(|v| v.as_bool())
                .unwrap_or(defaults.enabled),
        }
    }
}
