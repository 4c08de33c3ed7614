//! Structured logging utilities for cache-bust components.
//!
//! Provides consistent logging with component prefixes and structured fields.
//! All output goes to stderr; stdout is reserved for the run report.
//!
//! # Usage
//!
//! ```ignore
//! use cachebust_config::{log_bust_debug, log_cli_warn};
//!
//! log_bust_debug!("Read input", bytes = 1024);
//! log_cli_warn!("Ignoring broken config", error = "bad toml");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Env var holding a full `EnvFilter` directive; wins over `RUST_LOG`.
pub const LOG_ENV: &str = "CACHE_BUST_LOG";

/// Component identifiers for log filtering
pub struct Component;

impl Component {
    pub const CLI: &'static str = "CLI";
    pub const BUST: &'static str = "BUST";
}

/// Log levels for runtime configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

// === CLI logging macros ===

#[macro_export]
macro_rules! log_cli_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = $crate::logging::Component::CLI, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_cli_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::CLI, $($key = $value,)* $msg)
    };
}

// === BUST logging macros ===

#[macro_export]
macro_rules! log_bust_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::BUST, $($key = $value,)* $msg)
    };
}

/// Filter directive: `CACHE_BUST_LOG`, then `RUST_LOG`, then `level`.
pub fn env_filter(level: LogLevel) -> tracing_subscriber::EnvFilter {
    use tracing_subscriber::EnvFilter;

    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()))
}

/// Initialize logging with the given level filter.
/// Call this once at application startup.
pub fn init_logging(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
