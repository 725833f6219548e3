//! Configuration for a daylog logger
//!
//! Options are immutable once a logger is built. They can be assembled in code
//! with the `with_*` setters or loaded from a TOML file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Display width of the system name column when none is given
pub const DEFAULT_SYSTEM_WIDTH: usize = 7;

/// Name of the config file read by the `daylog` binary
pub const CONFIG_FILE: &str = "daylog.toml";

/// Name of the system emitting logs, optionally with its column width
///
/// In TOML this is either a plain string (`system = "worker"`) or a table
/// (`system = { name = "worker", width = 10 }`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SystemName {
    /// Name rendered with the default column width
    Name(String),
    /// Name rendered with an explicit column width
    Sized { name: String, width: usize },
}

impl SystemName {
    /// The configured name, as written
    pub fn name(&self) -> &str {
        match self {
            SystemName::Name(name) => name,
            SystemName::Sized { name, .. } => name,
        }
    }

    /// Width of the system column in characters
    pub fn width(&self) -> usize {
        match self {
            SystemName::Name(_) => DEFAULT_SYSTEM_WIDTH,
            SystemName::Sized { width, .. } => *width,
        }
    }
}

impl From<&str> for SystemName {
    fn from(name: &str) -> Self {
        SystemName::Name(name.to_string())
    }
}

impl From<String> for SystemName {
    fn from(name: String) -> Self {
        SystemName::Name(name)
    }
}

impl From<(&str, usize)> for SystemName {
    fn from((name, width): (&str, usize)) -> Self {
        SystemName::Sized {
            name: name.to_string(),
            width,
        }
    }
}

/// Logger options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggerOptions {
    /// System name shown in every line (default: "logger")
    #[serde(default = "default_system")]
    pub system: SystemName,

    /// Cluster id distinguishing instances of the same system (default: 0)
    #[serde(default)]
    pub cluster: u32,

    /// Whether debug lines are printed to the console (default: true)
    ///
    /// Debug lines are written to the log file either way.
    #[serde(default = "default_debug")]
    pub debug: bool,

    /// Directory holding the daily log files (default: ./logs)
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Delay between the end of one flush and the start of the next (default: 60000)
    #[serde(default = "default_save_interval_ms")]
    pub save_interval_ms: u64,

    /// Backoff after a failed flush or directory bootstrap (default: 5000)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_system() -> SystemName {
    SystemName::Name("logger".to_string())
}

fn default_debug() -> bool {
    true
}

fn default_path() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_save_interval_ms() -> u64 {
    60_000
}

fn default_retry_delay_ms() -> u64 {
    5_000
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            system: default_system(),
            cluster: 0,
            debug: default_debug(),
            path: default_path(),
            save_interval_ms: default_save_interval_ms(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl LoggerOptions {
    /// Load options from a TOML file, or return defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut options: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        options.path = expand_path(&options.path);
        Ok(options)
    }

    /// Set the system name
    pub fn with_system(mut self, system: impl Into<SystemName>) -> Self {
        self.system = system.into();
        self
    }

    /// Set the cluster id
    pub fn with_cluster(mut self, cluster: u32) -> Self {
        self.cluster = cluster;
        self
    }

    /// Set whether debug lines are printed
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the log directory
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the delay between flushes
    pub fn with_save_interval(mut self, interval: Duration) -> Self {
        self.save_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the backoff used after failures
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn save_interval(&self) -> Duration {
        Duration::from_millis(self.save_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Expand a leading `~` in a configured path
fn expand_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}
