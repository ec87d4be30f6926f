//! Local child-process engine.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Utc;
use tracing::{debug, info};

use crate::engine::{Artifact, EngineError, ExecutionEngine, JobOutcome};
use crate::path::WorkPath;
use crate::plan::{InvocationPlan, JobId};
use crate::workspace::{FsWorkspace, Workspace};

/// Runs each plan as a child process under a workspace root.
///
/// Inputs are checked before launch, and declared outputs left over from an
/// earlier run are removed so they cannot be mistaken for fresh ones. After
/// the process exits, every file under the plan's output directory is
/// inspected: on success only declared outputs are reported, on failure
/// everything is reported as diagnostics.
#[derive(Debug, Clone)]
pub struct LocalEngine {
    workspace: FsWorkspace,
}

impl LocalEngine {
    /// Creates an engine rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            workspace: FsWorkspace::new(root),
        }
    }

    fn program_path(&self, plan: &InvocationPlan) -> Result<PathBuf, EngineError> {
        let program = plan
            .command
            .first()
            .ok_or_else(|| EngineError::Rejected("empty command".to_string()))?;
        // Bare names go through PATH; anything with a separator is relative to the run dir.
        if program.contains('/') {
            Ok(self.workspace.resolve(&plan.run_dir.join(program)))
        } else {
            Ok(PathBuf::from(program))
        }
    }

    fn collect(&self, plan: &InvocationPlan, success: bool) -> Result<Vec<Artifact>, EngineError> {
        let files = self
            .workspace
            .files_under(&plan.output_dir)
            .map_err(|e| EngineError::Io {
                path: plan.output_dir.to_string(),
                message: e.to_string(),
            })?;
        Ok(files
            .into_iter()
            .filter(|f| !is_capture(f))
            .filter(|f| !success || plan.outputs.matches(f))
            .map(|f| {
                let location = self.workspace.resolve(&f);
                Artifact::on_disk(f, location)
            })
            .collect())
    }

    /// Deletes declared outputs already on disk. Declared inputs are kept.
    fn clear_stale_outputs(&self, plan: &InvocationPlan) -> Result<usize, EngineError> {
        let mut stale: Vec<WorkPath> = plan
            .outputs
            .files
            .iter()
            .filter(|f| self.workspace.resolve(f).exists())
            .cloned()
            .collect();
        for glob in &plan.outputs.globs {
            if !self.workspace.resolve(&glob.dir).is_dir() {
                continue;
            }
            let files = self
                .workspace
                .files_under(&glob.dir)
                .map_err(|e| EngineError::Io {
                    path: glob.dir.to_string(),
                    message: e.to_string(),
                })?;
            stale.extend(files.into_iter().filter(|f| plan.outputs.matches(f)));
        }

        let mut removed = 0;
        for path in stale.iter().filter(|p| !plan.inputs.contains(p)) {
            let location = self.workspace.resolve(path);
            let result = if location.is_dir() {
                fs::remove_dir_all(&location)
            } else {
                fs::remove_file(&location)
            };
            match result {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_err(&location, e)),
            }
        }
        Ok(removed)
    }
}

fn is_capture(path: &WorkPath) -> bool {
    matches!(path.file_name(), Some(CAPTURED_STDOUT | CAPTURED_STDERR))
}

const CAPTURED_STDOUT: &str = ".job.stdout";
const CAPTURED_STDERR: &str = ".job.stderr";

fn io_err(path: &Path, e: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

impl ExecutionEngine for LocalEngine {
    fn name(&self) -> &str {
        "local"
    }

    fn submit(&self, job_id: JobId, plan: &InvocationPlan) -> Result<JobOutcome, EngineError> {
        for input in &plan.inputs {
            if !self.workspace.resolve(input).exists() {
                return Err(EngineError::MissingInput(input.clone()));
            }
        }

        let output_dir = self.workspace.resolve(&plan.output_dir);
        fs::create_dir_all(&output_dir).map_err(|e| io_err(&output_dir, e))?;
        let run_dir = self.workspace.resolve(&plan.run_dir);
        fs::create_dir_all(&run_dir).map_err(|e| io_err(&run_dir, e))?;
        let removed = self.clear_stale_outputs(plan)?;
        if removed > 0 {
            debug!(%job_id, removed, output_dir = %plan.output_dir, "removed stale outputs");
        }

        let program = self.program_path(plan)?;
        debug!(%job_id, program = %program.display(), run_dir = %plan.run_dir, "launching job");

        let started_at = Utc::now();
        let output = Command::new(&program)
            .args(&plan.command[1..])
            .current_dir(&run_dir)
            .output()
            .map_err(|e| EngineError::Spawn {
                program: program.display().to_string(),
                message: e.to_string(),
            })?;
        let finished_at = Utc::now();

        // A process killed by a signal has no exit code.
        let exit_code = output.status.code().unwrap_or(-1);
        let success = exit_code == 0;
        let collected = self.collect(plan, success)?;
        let (outputs, failure_outputs) = if success {
            (collected, Vec::new())
        } else {
            (Vec::new(), collected)
        };

        info!(
            %job_id,
            stage = %plan.stage,
            exit_code,
            outputs = outputs.len(),
            failure_outputs = failure_outputs.len(),
            "job finished"
        );

        Ok(JobOutcome {
            job_id,
            exit_code,
            stdout: Some(Artifact::inline(
                plan.output_dir.join(CAPTURED_STDOUT),
                String::from_utf8_lossy(&output.stdout).into_owned(),
            )),
            stderr: Some(Artifact::inline(
                plan.output_dir.join(CAPTURED_STDERR),
                String::from_utf8_lossy(&output.stderr).into_owned(),
            )),
            outputs,
            failure_outputs,
            started_at,
            finished_at,
        })
    }
}
