//! In-memory execution engine.
//!
//! Returns pre-scripted outcomes in submission order and records every plan
//! it was handed. It is intended for tests, dry runs and as a reference
//! implementation of the engine contract.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::Utc;

use crate::engine::{Artifact, EngineError, ExecutionEngine, JobOutcome};
use crate::plan::{InvocationPlan, JobId};

fn lock_err(context: &'static str) -> EngineError {
    EngineError::Backend(format!("poisoned lock: {context}"))
}

/// One scripted job result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedOutcome {
    /// Exit code to report.
    pub exit_code: i32,
    /// Captured stdout of the job process.
    pub stdout: String,
    /// Captured stderr of the job process.
    pub stderr: String,
    /// Produced files as `(path, contents)`. Relative paths are resolved
    /// against the plan's output directory.
    pub outputs: Vec<(String, String)>,
    /// When set, the submission fails at the engine level with this reason.
    pub reject: Option<String>,
}

impl ScriptedOutcome {
    /// A successful job with no outputs.
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    /// A job exiting with `exit_code`.
    #[must_use]
    pub fn exit(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Self::default()
        }
    }

    /// An engine-level failure.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            reject: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Adds a produced file.
    #[must_use]
    pub fn with_output(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.outputs.push((path.into(), contents.into()));
        self
    }

    /// Sets the captured stdout.
    #[must_use]
    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    /// Sets the captured stderr.
    #[must_use]
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

/// Engine replaying scripted outcomes.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    queue: Mutex<VecDeque<ScriptedOutcome>>,
    fallback: ScriptedOutcome,
    submitted: Mutex<Vec<InvocationPlan>>,
}

impl ScriptedEngine {
    /// Creates an engine that answers every job with a bare success.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine that answers with `fallback` once the queue is empty.
    #[must_use]
    pub fn with_fallback(fallback: ScriptedOutcome) -> Self {
        Self {
            fallback,
            ..Self::default()
        }
    }

    /// Queues an outcome for the next submission.
    pub fn push(&self, outcome: ScriptedOutcome) -> Result<(), EngineError> {
        self.queue
            .lock()
            .map_err(|_| lock_err("scripted queue"))?
            .push_back(outcome);
        Ok(())
    }

    /// Returns every plan submitted so far, in order.
    pub fn submitted(&self) -> Result<Vec<InvocationPlan>, EngineError> {
        Ok(self
            .submitted
            .lock()
            .map_err(|_| lock_err("scripted submissions"))?
            .clone())
    }
}

impl ExecutionEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn submit(&self, job_id: JobId, plan: &InvocationPlan) -> Result<JobOutcome, EngineError> {
        let started_at = Utc::now();
        self.submitted
            .lock()
            .map_err(|_| lock_err("scripted submissions"))?
            .push(plan.clone());

        let scripted = self
            .queue
            .lock()
            .map_err(|_| lock_err("scripted queue"))?
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        if let Some(reason) = scripted.reject {
            return Err(EngineError::Rejected(reason));
        }

        let produced: Vec<Artifact> = scripted
            .outputs
            .iter()
            .map(|(path, contents)| Artifact::inline(plan.output_dir.join(path), contents.clone()))
            .collect();
        let (outputs, failure_outputs) = if scripted.exit_code == 0 {
            (produced, Vec::new())
        } else {
            (Vec::new(), produced)
        };

        Ok(JobOutcome {
            job_id,
            exit_code: scripted.exit_code,
            stdout: Some(Artifact::inline(plan.output_dir.join(".job.stdout"), scripted.stdout)),
            stderr: Some(Artifact::inline(plan.output_dir.join(".job.stderr"), scripted.stderr)),
            outputs,
            failure_outputs,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::path::WorkPath;
    use crate::plan::OutputLayout;

    fn plan() -> InvocationPlan {
        InvocationPlan {
            stage: Stage::Execute,
            backend: "test".to_string(),
            command: vec!["run".to_string()],
            run_dir: WorkPath::new("out"),
            inputs: Vec::new(),
            output_dir: WorkPath::new("out"),
            resources: Vec::new(),
            outputs: OutputLayout::default(),
            expected_output: None,
        }
    }

    #[test]
    fn replays_queue_then_fallback() {
        let engine = ScriptedEngine::with_fallback(ScriptedOutcome::exit(9));
        engine.push(ScriptedOutcome::success().with_output("sim.out", "ok")).unwrap();

        let first = engine.submit(JobId::new(), &plan()).unwrap();
        assert!(first.success());
        assert_eq!(first.outputs[0].path, WorkPath::new("out/sim.out"));

        let second = engine.submit(JobId::new(), &plan()).unwrap();
        assert_eq!(second.exit_code, 9);
        assert_eq!(engine.submitted().unwrap().len(), 2);
    }

    #[test]
    fn failed_jobs_report_failure_outputs() {
        let engine = ScriptedEngine::new();
        engine
            .push(ScriptedOutcome::exit(1).with_output("/run/a/sim.err", "boom"))
            .unwrap();
        let outcome = engine.submit(JobId::new(), &plan()).unwrap();
        assert!(outcome.outputs.is_empty());
        assert_eq!(outcome.failure_outputs[0].path, WorkPath::new("/run/a/sim.err"));
    }

    #[test]
    fn rejected_outcome_is_engine_error() {
        let engine = ScriptedEngine::new();
        engine.push(ScriptedOutcome::rejected("no license")).unwrap();
        let err = engine.submit(JobId::new(), &plan()).unwrap_err();
        assert!(matches!(err, EngineError::Rejected(reason) if reason == "no license"));
    }
}
