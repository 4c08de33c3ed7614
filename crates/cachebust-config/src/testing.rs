//! Test environment abstraction for isolated testing.
//!
//! Provides `TestEnvironment` to manage:
//! - A temporary project root for input and output files
//! - A fake home directory for global config
//!
//! # Usage
//!
//! ```ignore
//! use cachebust_config::testing::TestEnvironment;
//!
//! let env = TestEnvironment::new().unwrap();
//! let input = env.create_file("bundle.js", b"console.log(1);\n").unwrap();
//! // run against input, env.project_root.join("out.js")
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

use crate::Config;

/// Atomic counter for unique test IDs
static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Isolated test environment with unique paths
pub struct TestEnvironment {
    /// Temporary directory (dropped on cleanup)
    _temp_dir: TempDir,
    /// Working directory for the run; holds the project config
    pub project_root: PathBuf,
    /// Stand-in for `$HOME`; holds the global config
    pub home_dir: PathBuf,
    /// Unique test ID
    pub test_id: u32,
}

impl TestEnvironment {
    /// Create a new isolated test environment
    pub fn new() -> anyhow::Result<Self> {
        let test_id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        let project_root = root.join(format!("project-{}", test_id));
        let home_dir = root.join("home");

        std::fs::create_dir_all(&project_root)?;
        std::fs::create_dir_all(&home_dir)?;

        Ok(Self {
            _temp_dir: temp_dir,
            project_root,
            home_dir,
            test_id,
        })
    }

    /// Path of a file under the project root (not created)
    pub fn path(&self, relative_path: &str) -> PathBuf {
        self.project_root.join(relative_path)
    }

    /// Create a test file with content
    pub fn create_file(&self, relative_path: &str, content: &[u8]) -> anyhow::Result<PathBuf> {
        let path = self.path(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    pub fn global_config_path(&self) -> PathBuf {
        self.home_dir.join(crate::CONFIG_DIR).join("config.toml")
    }

    pub fn project_config_path(&self) -> PathBuf {
        Config::project_config_path(&self.project_root)
    }

    pub fn write_global_config(&self, toml: &str) -> anyhow::Result<PathBuf> {
        write_config(&self.global_config_path(), toml)
    }

    pub fn write_project_config(&self, toml: &str) -> anyhow::Result<PathBuf> {
        write_config(&self.project_config_path(), toml)
    }

    /// Load config the way the binary would when run from `project_root`
    /// with `home_dir` as `$HOME`, without touching the process environment.
    pub fn load_config(&self) -> Result<Config, crate::ConfigError> {
        let global = self.global_config_path();
        let project = self.project_config_path();
        Config::load_from(Some(global.as_path()), Some(project.as_path()))
    }

    /// Environment for spawning the binary against this environment.
    /// Log and label overrides are cleared so the host's settings don't leak in.
    pub fn command_env(&self) -> Vec<(String, Option<String>)> {
        vec![
            ("HOME".to_string(), Some(self.home_dir.display().to_string())),
            (crate::ENV_LABEL.to_string(), None),
            (crate::ENV_LOG_LEVEL.to_string(), None),
            (crate::logging::LOG_ENV.to_string(), None),
            ("RUST_LOG".to_string(), None),
        ]
    }
}

fn write_config(path: &Path, toml: &str) -> anyhow::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml)?;
    Ok(path.to_path_buf())
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}
