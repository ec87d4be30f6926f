//! Execution engine boundary.
//!
//! The engine is the external collaborator that actually schedules and runs
//! processes. simdispatch only hands it an [`InvocationPlan`] and reads back a
//! [`JobOutcome`]: exit status, captured logs and declared outputs.

/// Child-process engine running jobs on the local machine.
pub mod local;
/// Worker-pool runtime returning job tickets.
pub mod runtime;
/// In-memory engine with scripted outcomes.
pub mod scripted;

pub use local::LocalEngine;
pub use runtime::{EngineRuntime, JobTicket};
pub use scripted::{ScriptedEngine, ScriptedOutcome};

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::{ExecutionError, SimError, SimResult};
use crate::path::WorkPath;
use crate::plan::{InvocationPlan, JobId};

/// Errors reported by an execution engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A declared input does not exist.
    #[error("Declared input {0} does not exist")]
    MissingInput(WorkPath),

    /// The command could not be started.
    #[error("Failed to start '{program}': {message}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying error.
        message: String,
    },

    /// Filesystem error while staging or collecting outputs.
    #[error("I/O error at {path}: {message}")]
    Io {
        /// Path involved.
        path: String,
        /// Underlying error.
        message: String,
    },

    /// The engine refused the plan.
    #[error("Plan rejected: {0}")]
    Rejected(String),

    /// Internal engine failure.
    #[error("Engine backend error: {0}")]
    Backend(String),
}

impl From<EngineError> for SimError {
    fn from(err: EngineError) -> Self {
        SimError::Execution(ExecutionError::Engine {
            message: err.to_string(),
        })
    }
}

/// Where an artifact's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactBody {
    /// On disk, read lazily.
    File(PathBuf),
    /// Held in memory.
    Inline(String),
}

/// One file produced (or captured) by a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Workspace path of the artifact.
    pub path: WorkPath,
    /// Contents.
    pub body: ArtifactBody,
}

impl Artifact {
    /// An artifact whose contents are read from disk on demand.
    #[must_use]
    pub fn on_disk(path: WorkPath, location: impl Into<PathBuf>) -> Self {
        Self {
            path,
            body: ArtifactBody::File(location.into()),
        }
    }

    /// An artifact held in memory.
    #[must_use]
    pub fn inline(path: impl Into<WorkPath>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            body: ArtifactBody::Inline(contents.into()),
        }
    }

    /// Reads the artifact as UTF-8 text.
    pub fn read_to_string(&self) -> SimResult<String> {
        match &self.body {
            ArtifactBody::Inline(s) => Ok(s.clone()),
            ArtifactBody::File(location) => fs::read_to_string(location).map_err(|e| {
                SimError::Execution(ExecutionError::ArtifactRead {
                    path: self.path.clone(),
                    message: e.to_string(),
                })
            }),
        }
    }
}

/// What an engine reports once a job has finished.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// Identifier the job was submitted under.
    pub job_id: JobId,
    /// Process exit code; nonzero means failure.
    pub exit_code: i32,
    /// Captured standard output, if the engine keeps it.
    pub stdout: Option<Artifact>,
    /// Captured standard error, if the engine keeps it.
    pub stderr: Option<Artifact>,
    /// Declared outputs present after a successful run.
    pub outputs: Vec<Artifact>,
    /// Everything the job left behind when it failed.
    pub failure_outputs: Vec<Artifact>,
    /// When the job started.
    pub started_at: DateTime<Utc>,
    /// When the job finished.
    pub finished_at: DateTime<Utc>,
}

impl JobOutcome {
    /// Returns true if the job exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Wall-clock duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        let ms = (self.finished_at - self.started_at).num_milliseconds();
        u64::try_from(ms).unwrap_or(0)
    }
}

/// A job executor.
///
/// Implementations own scheduling, caching and retries. `submit` blocks the
/// caller until the job has finished (successfully or not).
pub trait ExecutionEngine: Send + Sync {
    /// Name of the engine (for logs).
    fn name(&self) -> &str;

    /// Runs the plan to completion.
    fn submit(&self, job_id: JobId, plan: &InvocationPlan) -> Result<JobOutcome, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure the trait is object-safe
    fn _assert_engine_object_safe(_: &dyn ExecutionEngine) {}

    #[test]
    fn inline_artifact_reads_contents() {
        let a = Artifact::inline("run/sim.out", "PASS");
        assert_eq!(a.read_to_string().unwrap(), "PASS");
    }

    #[test]
    fn missing_file_artifact_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let a = Artifact::on_disk(WorkPath::new("run/gone.log"), dir.path().join("gone.log"));
        let err = a.read_to_string().unwrap_err();
        assert!(err.to_string().contains("run/gone.log"));
    }

    #[test]
    fn engine_error_converts_to_execution_error() {
        let err: SimError = EngineError::MissingInput(WorkPath::new("rtl/top.sv")).into();
        assert!(err.is_execution());
        assert!(err.to_string().contains("rtl/top.sv"));
    }

    #[test]
    fn outcome_duration_is_never_negative() {
        let now = Utc::now();
        let outcome = JobOutcome {
            job_id: JobId::new(),
            exit_code: 0,
            stdout: None,
            stderr: None,
            outputs: Vec::new(),
            failure_outputs: Vec::new(),
            started_at: now,
            finished_at: now - chrono::Duration::milliseconds(5),
        };
        assert_eq!(outcome.duration_ms(), 0);
        assert!(outcome.success());
    }
}
