//! Simulation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::driver::{CompileResult, ExecuteResult};
use crate::error::{SimError, SimResult};
use crate::path::WorkPath;
use crate::plan::JobId;

/// Outcome of a full compile then execute pipeline.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Backend that served the request.
    pub backend: String,
    /// Design name.
    pub dut: String,
    /// Compile stage result.
    pub compile: CompileResult,
    /// Execute stage result.
    pub execute: ExecuteResult,
}

impl SimulationResult {
    /// Contents of the first captured execute output named `name`.
    pub fn read_output(&self, name: &str) -> SimResult<String> {
        self.execute.read_output(name)
    }

    /// Exit status of the simulation run.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.execute.exit_code()
    }

    /// Serialisable digest of the run.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let compile = &self.compile.outcome;
        let execute = &self.execute.outcome;
        RunSummary {
            backend: self.backend.clone(),
            dut: self.dut.clone(),
            compile: StageSummary {
                job_id: compile.job_id,
                fingerprint: self.compile.plan.fingerprint(),
                exit_code: compile.exit_code,
                duration_ms: compile.duration_ms(),
                outputs: self.compile.output_paths(),
            },
            execute: StageSummary {
                job_id: execute.job_id,
                fingerprint: self.execute.plan.fingerprint(),
                exit_code: execute.exit_code,
                duration_ms: execute.duration_ms(),
                outputs: execute.outputs.iter().map(|a| a.path.clone()).collect(),
            },
            binary: self.compile.binary.path.clone(),
            started_at: compile.started_at,
            finished_at: execute.finished_at,
        }
    }
}

/// Per-stage part of a [`RunSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    /// Job identifier.
    pub job_id: JobId,
    /// Plan fingerprint.
    pub fingerprint: String,
    /// Exit status.
    pub exit_code: i32,
    /// Wall-clock duration.
    pub duration_ms: u64,
    /// Reported outputs.
    pub outputs: Vec<WorkPath>,
}

/// Serialisable record of one simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Backend that served the request.
    pub backend: String,
    /// Design name.
    pub dut: String,
    /// Compile stage.
    pub compile: StageSummary,
    /// Execute stage.
    pub execute: StageSummary,
    /// Simulator executable.
    pub binary: WorkPath,
    /// Start of the compile job.
    pub started_at: DateTime<Utc>,
    /// End of the execute job.
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> SimResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SimError::internal(format!("summary encoding failed: {e}")))
    }
}
