//! Client configuration for the TaskWarrior engine
//!
//! Covers the binary name, the taskrc file, the data directory, and the
//! fixed safety preamble appended to every invocation. The engine's own
//! environment overrides (`TASKRC`, `TASKDATA`) are respected; nothing
//! beyond those is required from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Safety options appended to every invocation: interactive confirmation
/// and bulk-change confirmation are disabled so no call ever blocks on a
/// prompt.
pub const DEFAULT_OPTIONS: [&str; 2] = ["rc.confirmation=off", "rc.bulk=0"];

/// Configuration for a TaskWarrior client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Binary name or path, resolved through `PATH`
    pub task_cmd: String,

    /// Path to the taskrc configuration file
    pub taskrc: PathBuf,

    /// Task data directory; `None` defers to the taskrc
    pub data_location: Option<PathBuf>,

    /// Per-invocation timeout; `None` blocks until the engine returns
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            task_cmd: "task".to_string(),
            taskrc: default_taskrc(),
            data_location: std::env::var_os("TASKDATA").map(PathBuf::from),
            timeout: None,
        }
    }
}

fn default_taskrc() -> PathBuf {
    if let Some(taskrc) = std::env::var_os("TASKRC") {
        return PathBuf::from(taskrc);
    }
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".taskrc")
}

impl Config {
    /// Create a configuration pointing at an explicit taskrc file
    pub fn with_taskrc(taskrc: impl Into<PathBuf>) -> Self {
        Self {
            taskrc: taskrc.into(),
            ..Self::default()
        }
    }

    pub fn task_cmd(mut self, task_cmd: impl Into<String>) -> Self {
        self.task_cmd = task_cmd.into();
        self
    }

    pub fn data_location(mut self, data_location: impl Into<PathBuf>) -> Self {
        self.data_location = Some(data_location.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fixed option preamble appended to every invocation
    ///
    /// Points the engine at the configured taskrc and data directory and
    /// disables confirmation prompts.
    pub fn options(&self) -> Vec<String> {
        let mut options = vec![format!("rc:{}", self.taskrc.display())];
        if let Some(data) = &self.data_location {
            options.push(format!("rc.data.location={}", data.display()));
        }
        options.extend(DEFAULT_OPTIONS.iter().map(|s| s.to_string()));
        options
    }

    /// Create the taskrc file and data directory if they do not exist
    ///
    /// A missing taskrc is replaced with a minimal default (confirmation
    /// disabled, data-location pointer) instead of failing the first call.
    pub fn ensure_files(&self) -> Result<()> {
        if !self.taskrc.exists() {
            if let Some(parent) = self.taskrc.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&self.taskrc, self.default_taskrc_content())?;
        }
        if let Some(data) = &self.data_location {
            if !data.exists() {
                std::fs::create_dir_all(data)?;
            }
        }
        Ok(())
    }

    fn default_taskrc_content(&self) -> String {
        let data_location = self
            .data_location
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.task".to_string());
        format!(
            "# TaskWarrior configuration file\n\
             # Created automatically by tasklink\n\
             data.location={}\n\
             confirmation=off\n\
             bulk=0\n",
            data_location
        )
    }

    /// Read the taskrc contents
    pub fn read_taskrc(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.taskrc)?)
    }

    /// Path to the taskrc file
    pub fn taskrc_path(&self) -> &Path {
        &self.taskrc
    }
}
