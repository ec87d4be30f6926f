//! Execution driver.
//!
//! Hands plans to the engine and post-processes what comes back: compile
//! results must contain the expected binary, execute results expose their
//! captured files through [`ExecuteResult::read_output`].

use std::sync::Arc;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::LogConfig;
use crate::engine::{Artifact, ExecutionEngine, JobOutcome};
use crate::error::{ExecutionError, JobDiagnostics, SimResult, Stage, ValidationError};
use crate::path::WorkPath;
use crate::plan::{InvocationPlan, JobId};

/// File the log wrapper writes the simulator's stdout to.
pub const STDOUT_LOG: &str = "sim.out";

/// File the log wrapper writes the simulator's stderr to.
pub const STDERR_LOG: &str = "sim.err";

/// Returns the contents of the first artifact whose path contains `name` as
/// a whole path component.
pub fn find_output(artifacts: &[Artifact], name: &str) -> SimResult<String> {
    let pattern = format!("(?:^|/){}(?:/|$)", regex::escape(name));
    let re = Regex::new(&pattern).map_err(|e| ValidationError::InvalidPattern {
        pattern: name.to_string(),
        reason: e.to_string(),
    })?;
    artifacts
        .iter()
        .find(|a| re.is_match(a.path.as_str()))
        .ok_or_else(|| ExecutionError::NamedOutputNotFound {
            name: name.to_string(),
        })?
        .read_to_string()
}

/// A successful compile.
#[derive(Debug, Clone)]
pub struct CompileResult {
    /// Plan that was run.
    pub plan: InvocationPlan,
    /// What the engine reported.
    pub outcome: JobOutcome,
    /// The simulator executable.
    pub binary: Artifact,
}

impl CompileResult {
    /// Paths of every compile output, binary included.
    #[must_use]
    pub fn output_paths(&self) -> Vec<WorkPath> {
        self.outcome.outputs.iter().map(|a| a.path.clone()).collect()
    }
}

/// A successful execute.
#[derive(Debug, Clone)]
pub struct ExecuteResult {
    /// Plan that was run.
    pub plan: InvocationPlan,
    /// What the engine reported.
    pub outcome: JobOutcome,
}

impl ExecuteResult {
    /// Contents of the first captured output named `name`.
    pub fn read_output(&self, name: &str) -> SimResult<String> {
        find_output(&self.outcome.outputs, name)
    }

    /// Retained tail of the simulator's stdout.
    pub fn stdout(&self) -> SimResult<String> {
        self.read_output(STDOUT_LOG)
    }

    /// Retained tail of the simulator's stderr.
    pub fn stderr(&self) -> SimResult<String> {
        self.read_output(STDERR_LOG)
    }

    /// Exit status of the simulation.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.outcome.exit_code
    }
}

fn expect_stage(plan: &InvocationPlan, expected: Stage) -> Result<(), ValidationError> {
    if plan.stage == expected {
        Ok(())
    } else {
        Err(ValidationError::StageMismatch {
            expected,
            actual: plan.stage,
        })
    }
}

/// Submits plans and interprets their outcomes.
#[derive(Clone)]
pub struct ExecutionDriver {
    engine: Arc<dyn ExecutionEngine>,
    logs: LogConfig,
}

impl std::fmt::Debug for ExecutionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionDriver")
            .field("engine", &self.engine.name())
            .field("logs", &self.logs)
            .finish()
    }
}

impl ExecutionDriver {
    /// Creates a driver over `engine`.
    #[must_use]
    pub fn new(engine: Arc<dyn ExecutionEngine>, logs: LogConfig) -> Self {
        Self { engine, logs }
    }

    /// Log retention passed to the log wrapper.
    #[must_use]
    pub const fn logs(&self) -> LogConfig {
        self.logs
    }

    /// Name of the underlying engine.
    #[must_use]
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    fn run(&self, plan: &InvocationPlan) -> SimResult<JobOutcome> {
        plan.validate()?;
        let job_id = JobId::new();
        debug!(
            %job_id,
            stage = %plan.stage,
            backend = %plan.backend,
            fingerprint = %plan.fingerprint(),
            command = ?plan.command,
            "submitting plan"
        );

        let outcome = self.engine.submit(job_id, plan)?;
        info!(
            %job_id,
            stage = %plan.stage,
            backend = %plan.backend,
            exit_code = outcome.exit_code,
            duration_ms = outcome.duration_ms(),
            "job completed"
        );

        if !outcome.success() {
            return Err(ExecutionError::JobFailed {
                stage: plan.stage,
                exit_code: outcome.exit_code,
                diagnostics: Box::new(JobDiagnostics {
                    stdout: outcome.stdout,
                    stderr: outcome.stderr,
                    outputs: outcome.failure_outputs,
                }),
            }
            .into());
        }
        Ok(outcome)
    }

    /// Runs a compile plan and locates the expected binary among its outputs.
    ///
    /// A job that exits cleanly without producing the binary is an error.
    pub fn compile(&self, plan: InvocationPlan) -> SimResult<CompileResult> {
        expect_stage(&plan, Stage::Compile)?;
        let binary_name = plan
            .expected_output
            .clone()
            .ok_or_else(|| ValidationError::MissingField {
                field: "expected_output".to_string(),
            })?;
        let outcome = self.run(&plan)?;

        let Some(binary) = outcome
            .outputs
            .iter()
            .find(|a| a.path.file_name() == Some(binary_name.as_str()))
            .cloned()
        else {
            warn!(
                backend = %plan.backend,
                binary = %binary_name,
                output_dir = %plan.output_dir,
                "compile succeeded without producing the binary"
            );
            return Err(ExecutionError::CompileArtifactMissing {
                binary: binary_name,
                output_dir: plan.output_dir,
            }
            .into());
        };

        Ok(CompileResult {
            plan,
            outcome,
            binary,
        })
    }

    /// Runs an execute plan.
    pub fn execute(&self, plan: InvocationPlan) -> SimResult<ExecuteResult> {
        expect_stage(&plan, Stage::Execute)?;
        let outcome = self.run(&plan)?;
        Ok(ExecuteResult { plan, outcome })
    }
}
