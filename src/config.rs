//! Configuration for simdispatch.
//!
//! Configuration is loaded from JSON (`SimConfig::from_path`) or built with
//! `SimConfig::default()`. It covers:
//! 1. **Logs:** how many trailing stdout/stderr lines the log wrapper retains.
//! 2. **Runtime:** worker and queue sizing of the submission runtime.
//! 3. **Tools:** per-vendor installation (wrapper scripts, version, priority).
//! 4. **Directories:** default compile and execute output locations.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SimResult, ValidationError};
use crate::path::WorkPath;
use crate::preferences::UserPreferences;

/// Default configuration constants.
pub(crate) mod defaults {
    /// Trailing stdout lines kept by the log wrapper.
    pub const STDOUT_TAIL_LINES: u32 = 5000;

    /// Trailing stderr lines kept by the log wrapper.
    pub const STDERR_TAIL_LINES: u32 = 5000;

    /// Submission runtime worker threads.
    pub const RUNTIME_WORKERS: usize = 2;

    /// Submission runtime queue capacity.
    pub const RUNTIME_QUEUE_CAPACITY: usize = 64;

    pub const COMPILE_DIR: &str = "build/sim/compile";
    pub const EXECUTE_DIR: &str = "build/sim/execute";

    pub const LOG_WRAPPER: &str = "scripts/run-logged";

    pub const VCS_COMPILE_WRAPPER: &str = "scripts/vcs-compile";
    pub const VCS_VERSION: &str = "2023.03";
    pub const VCS_PRIORITY: f64 = 1.0;

    pub const XCELIUM_COMPILE_WRAPPER: &str = "scripts/xrun-compile";
    pub const XCELIUM_VERSION: &str = "23.09";
    pub const XCELIUM_PRIORITY: f64 = 0.9;
}

/// Log retention applied by the execute-stage log wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Trailing stdout lines retained.
    pub stdout_tail_lines: u32,
    /// Trailing stderr lines retained.
    pub stderr_tail_lines: u32,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            stdout_tail_lines: defaults::STDOUT_TAIL_LINES,
            stderr_tail_lines: defaults::STDERR_TAIL_LINES,
        }
    }
}

impl LogConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.stdout_tail_lines == 0 {
            return Err(ValidationError::ZeroTailLimit {
                stream: "stdout".to_string(),
            });
        }
        if self.stderr_tail_lines == 0 {
            return Err(ValidationError::ZeroTailLimit {
                stream: "stderr".to_string(),
            });
        }
        Ok(())
    }
}

/// Sizing of the submission runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Maximum queued submissions.
    pub queue_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: defaults::RUNTIME_WORKERS,
            queue_capacity: defaults::RUNTIME_QUEUE_CAPACITY,
        }
    }
}

/// Installation details for one vendor tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolInstall {
    /// Script that wraps the vendor compiler.
    pub compile_wrapper: WorkPath,
    /// Script that runs a binary and tails its logs.
    #[serde(default = "default_log_wrapper")]
    pub log_wrapper: WorkPath,
    /// Tool version, used in resource tags.
    pub version: String,
    /// Base dispatch score of backends using this tool.
    #[serde(default = "default_priority")]
    pub priority: f64,
}

fn default_log_wrapper() -> WorkPath {
    WorkPath::new(defaults::LOG_WRAPPER)
}

fn default_priority() -> f64 {
    1.0
}

/// Per-vendor tool installations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Synopsys VCS.
    pub vcs: ToolInstall,
    /// Cadence Xcelium.
    pub xcelium: ToolInstall,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            vcs: ToolInstall {
                compile_wrapper: WorkPath::new(defaults::VCS_COMPILE_WRAPPER),
                log_wrapper: default_log_wrapper(),
                version: defaults::VCS_VERSION.to_string(),
                priority: defaults::VCS_PRIORITY,
            },
            xcelium: ToolInstall {
                compile_wrapper: WorkPath::new(defaults::XCELIUM_COMPILE_WRAPPER),
                log_wrapper: default_log_wrapper(),
                version: defaults::XCELIUM_VERSION.to_string(),
                priority: defaults::XCELIUM_PRIORITY,
            },
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Log retention.
    pub logs: LogConfig,
    /// Submission runtime sizing.
    pub runtime: RuntimeConfig,
    /// Tool installations.
    pub tools: ToolsConfig,
    /// Default compile output directory.
    pub default_compile_dir: WorkPath,
    /// Default execute output directory.
    pub default_execute_dir: WorkPath,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            logs: LogConfig::default(),
            runtime: RuntimeConfig::default(),
            tools: ToolsConfig::default(),
            default_compile_dir: WorkPath::new(defaults::COMPILE_DIR),
            default_execute_dir: WorkPath::new(defaults::EXECUTE_DIR),
        }
    }
}

impl SimConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Checks invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.logs.validate()?;
        for dir in [&self.default_compile_dir, &self.default_execute_dir] {
            if dir.escapes_root() {
                return Err(ValidationError::PathEscapesRoot {
                    path: dir.to_string(),
                });
            }
        }
        Ok(())
    }

    /// User preferences seeded with the configured output directories.
    #[must_use]
    pub fn preferences(&self) -> UserPreferences {
        UserPreferences::new(self.default_compile_dir.clone(), self.default_execute_dir.clone())
    }
}
