//! # cachebust-config
//!
//! Configuration management for cache-bust.
//!
//! Loads configuration from:
//! 1. `~/.cache-bust/config.toml` (global)
//! 2. `.cache-bust/config.toml` (project-local, overrides global)
//! 3. Environment variables (highest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod logging;
pub mod path;
pub mod testing;

pub use logging::LogLevel;

/// Directory holding `config.toml`, both under `$HOME` and in the project.
pub const CONFIG_DIR: &str = ".cache-bust";

/// Overrides `stamp.label`
pub const ENV_LABEL: &str = "CACHE_BUST_LABEL";
/// Overrides `logging.level`
pub const ENV_LOG_LEVEL: &str = "CACHE_BUST_LOG_LEVEL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub stamp: StampConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from standard locations
    pub fn load() -> Result<Self, ConfigError> {
        let global = Self::global_config_path();
        let project = Self::project_config_path(".");
        let mut config = Self::load_from(global.as_deref(), Some(project.as_path()))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load and layer the given files. Missing files are skipped; keys in
    /// `project` replace the same keys in `global`.
    pub fn load_from(global: Option<&Path>, project: Option<&Path>) -> Result<Self, ConfigError> {
        let mut table = toml::Table::new();

        for path in [global, project].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let layer: toml::Table =
                toml::from_str(&contents).map_err(|source| ConfigError::Toml {
                    path: path.to_path_buf(),
                    source,
                })?;
            merge_tables(&mut table, layer);
        }

        let config: Config = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Invalid(e.to_string()))?;
        validate_label(&config.stamp.label).map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Global config path: ~/.cache-bust/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR).join("config.toml"))
    }

    /// Project config path under `root`: <root>/.cache-bust/config.toml
    pub fn project_config_path(root: impl AsRef<Path>) -> PathBuf {
        root.as_ref().join(CONFIG_DIR).join("config.toml")
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// [`Config::load`]). Unparseable values and unusable labels are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(label) = lookup(ENV_LABEL) {
            let label = label.trim();
            if validate_label(label).is_ok() {
                self.stamp.label = label.to_string();
            }
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            if let Ok(level) = level.parse() {
                self.logging.level = level;
            }
        }
    }
}

/// Check that `label` fits inside a single-line `/* ... */` comment.
pub fn validate_label(label: &str) -> Result<(), String> {
    if label.trim().is_empty() {
        return Err("stamp label is empty".to_string());
    }
    if label.contains(['\n', '\r']) {
        return Err(format!("stamp label {label:?} spans more than one line"));
    }
    if label.contains("*/") {
        return Err(format!("stamp label {label:?} closes the comment"));
    }
    Ok(())
}

fn merge_tables(base: &mut toml::Table, layer: toml::Table) {
    for (key, value) in layer {
        let toml::Value::Table(incoming) = value else {
            base.insert(key, value);
            continue;
        };
        if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
            merge_tables(existing, incoming);
            continue;
        }
        base.insert(key, toml::Value::Table(incoming));
    }
}

/// Stamp comment settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampConfig {
    /// Label inside the comment: `/* <label>: <secs> */`
    pub label: String,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            label: "BUILD_VERSION".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Used when neither `CACHE_BUST_LOG` nor `RUST_LOG` is set
    pub level: LogLevel,
}
