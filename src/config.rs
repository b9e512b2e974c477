//! Configuration for taskline.
//!
//! Settings come from an optional YAML file. The task file location can be
//! overridden by the `TASKLINE_FILE` environment variable and the `--file`
//! flag, in increasing order of precedence.

use crate::storage::DEFAULT_TASKS_FILE;
use eyre::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the task file location.
pub const ENV_TASKS_FILE: &str = "TASKLINE_FILE";

/// Config file name inside the per-user config directory.
const CONFIG_FILE: &str = "taskline.yml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Task file; relative paths resolve against the working directory
    pub tasks_file: PathBuf,

    /// Hold an advisory lock across load-mutate-save
    pub lock: bool,

    /// Reject dependency cycles when loading
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tasks_file: PathBuf::from(DEFAULT_TASKS_FILE),
            lock: true,
            strict: false,
        }
    }
}

impl Config {
    /// Per-user config file: `<config_dir>/taskline/taskline.yml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("taskline").join(CONFIG_FILE))
    }

    /// Parse a config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load the explicit config file if given, else the per-user one if it
    /// exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            debug!("Loading config from {}", path.display());
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => {
                debug!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Apply environment and flag overrides for the task file.
    pub fn with_overrides(mut self, env_file: Option<OsString>, flag_file: Option<PathBuf>) -> Self {
        if let Some(env_file) = env_file.filter(|v| !v.is_empty()) {
            self.tasks_file = PathBuf::from(env_file);
        }
        if let Some(flag_file) = flag_file {
            self.tasks_file = flag_file;
        }
        self
    }

    /// Make the task file absolute against `cwd`.
    pub fn resolved(mut self, cwd: &Path) -> Self {
        if self.tasks_file.is_relative() {
            self.tasks_file = cwd.join(&self.tasks_file);
        }
        self
    }
}
