//! Simulator backends.
//!
//! A backend turns a [`SimulationRequest`] into two invocation plans
//! (compile, then execute) for one vendor tool. Each backend also scores
//! requests so the registry can pick between interchangeable candidates.

/// Dynamic option hooks.
pub mod hooks;
/// Shared vendor-tool plan construction.
pub mod tool;
/// Synopsys VCS.
pub mod vcs;
/// Cadence Xcelium.
pub mod xcelium;

pub use hooks::{HookSet, NamedHook};
pub use tool::{ToolBackend, ToolProfile};

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::driver::{CompileResult, ExecutionDriver};
use crate::error::SimResult;
use crate::plan::InvocationPlan;
use crate::request::SimulationRequest;
use crate::result::SimulationResult;
use crate::workspace::Workspace;

/// Identity of a backend, as seen by selection predicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Unique backend name.
    pub name: String,
    /// Tool vendor.
    pub vendor: String,
    /// Test-driver identifier the backend is built for.
    pub test_driver: String,
    /// Whether the backend captures waveforms.
    pub waveforms: bool,
}

impl fmt::Display for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.vendor)?;
        if self.waveforms {
            write!(f, " +waves")?;
        }
        Ok(())
    }
}

/// Collaborators a backend needs to run a request.
#[derive(Clone, Copy)]
pub struct InvocationContext<'a> {
    /// Submits plans to the engine.
    pub driver: &'a ExecutionDriver,
    /// Resolves include directories to files.
    pub workspace: &'a dyn Workspace,
}

/// A simulator integration.
pub trait Backend: Send + Sync {
    /// Identity used for filtering.
    fn descriptor(&self) -> &BackendDescriptor;

    /// Suitability of this backend for `request`. Higher wins.
    ///
    /// Must be pure; only called for requests that passed the filter.
    fn score(&self, request: &SimulationRequest) -> f64;

    /// Builds the compile plan.
    fn compile_plan(&self, request: &SimulationRequest, workspace: &dyn Workspace) -> SimResult<InvocationPlan>;

    /// Builds the execute plan from a finished compile.
    fn execute_plan(
        &self,
        request: &SimulationRequest,
        compiled: &CompileResult,
        driver: &ExecutionDriver,
    ) -> SimResult<InvocationPlan>;

    /// Compiles, then executes.
    ///
    /// The execute plan is only built once the compile result is available,
    /// so its inputs always include the compile outputs.
    fn invoke(&self, request: &SimulationRequest, ctx: InvocationContext<'_>) -> SimResult<SimulationResult> {
        let name = &self.descriptor().name;
        let compile_plan = self.compile_plan(request, ctx.workspace)?;
        debug!(backend = %name, fingerprint = %compile_plan.fingerprint(), "compile plan built");
        let compiled = ctx.driver.compile(compile_plan)?;

        let execute_plan = self.execute_plan(request, &compiled, ctx.driver)?;
        debug!(backend = %name, fingerprint = %execute_plan.fingerprint(), "execute plan built");
        let executed = ctx.driver.execute(execute_plan)?;

        Ok(SimulationResult {
            backend: name.clone(),
            dut: request.dut.name.clone(),
            compile: compiled,
            execute: executed,
        })
    }
}
