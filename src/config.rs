//! Configuration module for the folder monitor.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! The monitoring core never reads configuration itself. The binary loads
//! [`Settings`] and hands [`WatchConfig`] to [`crate::Monitor::new`].
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `PREVIEW_UNBLOCK_` and use double
//! underscores to separate nested levels:
//! - `PREVIEW_UNBLOCK_WATCH__DEBOUNCE_MS=2000` sets `watch.debounce_ms`
//! - `PREVIEW_UNBLOCK_WATCH__SCAN_CONCURRENCY=8` sets `watch.scan_concurrency`
//! - `PREVIEW_UNBLOCK_LOGGING__DEFAULT=info` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "preview-unblock.toml";

const ENV_PREFIX: &str = "PREVIEW_UNBLOCK_";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    /// Folder monitoring tunables
    #[serde(default)]
    pub watch: WatchConfig,

    /// Diagnostic logging levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// How long a path stays in the dedup window after it was first seen
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Retries after the first exclusive open fails
    #[serde(default = "default_ready_retries")]
    pub ready_retries: u32,

    /// Pause before each readiness retry
    #[serde(default = "default_ready_delay_ms")]
    pub ready_delay_ms: u64,

    /// Files processed at once during the initial scan
    #[serde(default = "default_scan_concurrency")]
    pub scan_concurrency: usize,

    /// Capacity of the channel between the OS watcher and the dispatcher
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Activity lines retained for display
    #[serde(default = "default_log_history")]
    pub log_history: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for every target (`error`, `warn`, `info`, `debug`, `trace`)
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `preview_unblock::monitor = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_debounce_ms() -> u64 { 5_000 }
fn default_ready_retries() -> u32 { 3 }
fn default_ready_delay_ms() -> u64 { 500 }
fn default_scan_concurrency() -> usize { 4 }
fn default_event_buffer() -> usize { 100 }
fn default_log_history() -> usize { 1_000 }
fn default_log_level() -> String { "warn".to_string() }

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            ready_retries: default_ready_retries(),
            ready_delay_ms: default_ready_delay_ms(),
            scan_concurrency: default_scan_concurrency(),
            event_buffer: default_event_buffer(),
            log_history: default_log_history(),
        }
    }
}

impl WatchConfig {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn ready_delay(&self) -> Duration {
        Duration::from_millis(self.ready_delay_ms)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from defaults, `preview-unblock.toml` in the
    /// working directory (if present) and the environment.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::load_from(PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore becomes a dot, single underscores stay in field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
