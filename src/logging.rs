//! Diagnostic logging for the monitor.
//!
//! Provides compact timestamped logging with per-module level configuration.
//! Supports `RUST_LOG` environment variable for runtime overrides.
//!
//! This is separate from the activity log shown to the user
//! (see [`crate::monitor::ActivityLog`]); every activity line is mirrored here
//! at `info` level under the `activity` component.
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! default = "warn"  # quiet by default
//!
//! [logging.modules]
//! "preview_unblock::monitor" = "debug"
//! ```
//!
//! # Environment Variable
//!
//! `RUST_LOG` takes precedence over config:
//! ```bash
//! RUST_LOG=debug preview-unblock ~/Downloads
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Build the filter directive string from configuration.
fn filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.default.clone();
    let mut modules: Vec<_> = config.modules.iter().collect();
    modules.sort();
    for (module, level) in modules {
        filter_str.push_str(&format!(",{module}={level}"));
    }
    filter_str
}

/// Initialize logging with configuration.
///
/// Call once at startup. Safe to call multiple times (only first call takes effect).
/// Output goes to stderr so stdout stays free for activity lines.
///
/// The `RUST_LOG` environment variable takes precedence over config settings.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(filter_directives(config))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Initialize logging with default configuration.
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

/// Log an event with component context.
///
/// # Examples
/// ```ignore
/// log_event!("session", "started", "{}", dir.display());
/// log_event!("scanner", "complete");
/// ```
#[macro_export]
macro_rules! log_event {
    ($component:expr, $event:expr) => {
        tracing::info!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

/// Debug-only event logging.
///
/// # Examples
/// ```ignore
/// debug_event!("dedup", "suppressed", "{}", path.display());
/// ```
#[macro_export]
macro_rules! debug_event {
    ($component:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_filter_directives_default_only() {
        let config = LoggingConfig::default();
        assert_eq!(filter_directives(&config), "warn");
    }

    #[test]
    fn test_filter_directives_with_modules() {
        let mut modules = HashMap::new();
        modules.insert("preview_unblock::monitor".to_string(), "debug".to_string());
        modules.insert("notify".to_string(), "error".to_string());
        let config = LoggingConfig {
            default: "info".to_string(),
            modules,
        };
        assert_eq!(
            filter_directives(&config),
            "info,notify=error,preview_unblock::monitor=debug"
        );
    }
}
