//! Error types for simdispatch.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the specific failure (no backend matched, missing compile artifact,
//! failed job, ...) instead of parsing messages.

use std::fmt;

use thiserror::Error;

use crate::engine::Artifact;
use crate::path::WorkPath;

/// Validation errors raised while constructing requests, options and plans.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Path '{path}' escapes the workspace root")]
    PathEscapesRoot {
        path: String,
    },

    #[error("Invalid output pattern '{pattern}': {reason}")]
    InvalidPattern {
        pattern: String,
        reason: String,
    },

    #[error("Compile and execute stages share output directory '{dir}'")]
    SharedOutputDir {
        dir: String,
    },

    #[error("Backend '{name}' is already registered")]
    DuplicateBackend {
        name: String,
    },

    #[error("Tail limit for {stream} must be greater than zero")]
    ZeroTailLimit {
        stream: String,
    },

    #[error("Expected a {expected} plan, got a {actual} plan")]
    StageMismatch {
        expected: Stage,
        actual: Stage,
    },

    #[error("Invocation plan for {stage} has an empty command line")]
    EmptyCommand {
        stage: Stage,
    },
}

/// Errors raised while choosing a backend for a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("No registered backend matches {criteria}")]
    BackendNotFound {
        criteria: String,
    },
}

/// The two job stages a simulation goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Building the simulator binary from sources.
    Compile,
    /// Running the compiled binary.
    Execute,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile => write!(f, "compile"),
            Self::Execute => write!(f, "execute"),
        }
    }
}

/// Diagnostics captured from a job that exited unsuccessfully.
///
/// Carries the failure-path outputs the engine captured so they can still
/// be inspected with [`JobDiagnostics::read_output`].
#[derive(Debug, Clone, Default)]
pub struct JobDiagnostics {
    /// Captured stdout of the job process.
    pub stdout: Option<Artifact>,
    /// Captured stderr of the job process.
    pub stderr: Option<Artifact>,
    /// Files the job left behind.
    pub outputs: Vec<Artifact>,
}

impl JobDiagnostics {
    /// Look up a captured failure output by file name.
    pub fn read_output(&self, name: &str) -> SimResult<String> {
        crate::driver::find_output(&self.outputs, name)
    }
}

/// Execution errors raised while running or post-processing jobs.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Compile job succeeded but produced no '{binary}' under {output_dir}")]
    CompileArtifactMissing {
        binary: String,
        output_dir: WorkPath,
    },

    #[error("could not find {name}")]
    NamedOutputNotFound {
        name: String,
    },

    #[error("{stage} job exited with status {exit_code}")]
    JobFailed {
        stage: Stage,
        exit_code: i32,
        diagnostics: Box<JobDiagnostics>,
    },

    #[error("Execution engine error: {message}")]
    Engine {
        message: String,
    },

    #[error("Submission queue is full (capacity {capacity})")]
    QueueFull {
        capacity: usize,
    },

    #[error("Submission runtime disconnected")]
    Disconnected,

    #[error("Job did not complete within {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Failed to list files under {path}: {message}")]
    Discovery {
        path: WorkPath,
        message: String,
    },

    #[error("Failed to read artifact {path}: {message}")]
    ArtifactRead {
        path: WorkPath,
        message: String,
    },
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level error type for simdispatch.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl SimError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a dispatch error.
    #[must_use]
    pub const fn is_dispatch(&self) -> bool {
        matches!(self, Self::Dispatch(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns the exit code when this error is a failed job.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Execution(ExecutionError::JobFailed { exit_code, .. }) => Some(*exit_code),
            _ => None,
        }
    }
}

/// Result type alias for simdispatch operations.
pub type SimResult<T> = Result<T, SimError>;
