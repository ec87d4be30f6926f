//! Request façade.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, info_span};

use crate::backend::{HookSet, InvocationContext};
use crate::config::SimConfig;
use crate::driver::ExecutionDriver;
use crate::dut::DesignUnderTest;
use crate::engine::{EngineRuntime, ExecutionEngine, LocalEngine};
use crate::error::SimResult;
use crate::options::{CompileOptions, ExecuteOptions};
use crate::preferences::UserPreferences;
use crate::registry::BackendRegistry;
use crate::request::SimulationRequest;
use crate::result::SimulationResult;
use crate::workspace::{FsWorkspace, Workspace};

/// Entry point: routes requests to a backend and runs them.
///
/// # Example
/// ```rust,ignore
/// let config = SimConfig::from_path("sim.json")?;
/// let sim = Simulator::local(&config, HookSet::new(), ".")?;
/// let result = sim.simulate_with(
///     DesignUnderTest::new("gcd", "GCD").with_source("rtl/gcd.sv"),
///     CompileOptions::new(),
///     ExecuteOptions::new(),
///     config.preferences(),
/// )?;
/// println!("{}", result.read_output("sim.out")?);
/// ```
pub struct Simulator {
    registry: BackendRegistry,
    driver: ExecutionDriver,
    workspace: Arc<dyn Workspace>,
}

impl Simulator {
    /// Assembles a simulator from its parts.
    #[must_use]
    pub fn new(registry: BackendRegistry, driver: ExecutionDriver, workspace: Arc<dyn Workspace>) -> Self {
        Self {
            registry,
            driver,
            workspace,
        }
    }

    /// Stock backends over an arbitrary engine.
    pub fn from_config(
        config: &SimConfig,
        hooks: HookSet,
        engine: Arc<dyn ExecutionEngine>,
        workspace: Arc<dyn Workspace>,
    ) -> SimResult<Self> {
        config.validate()?;
        let registry = BackendRegistry::standard(config, hooks)?;
        Ok(Self::new(registry, ExecutionDriver::new(engine, config.logs), workspace))
    }

    /// Stock backends running jobs as local processes under `root`,
    /// through a worker pool sized by `config.runtime`.
    pub fn local(config: &SimConfig, hooks: HookSet, root: impl Into<PathBuf>) -> SimResult<Self> {
        let root = root.into();
        let runtime = EngineRuntime::start(Arc::new(LocalEngine::new(root.clone())), config.runtime)?;
        Self::from_config(config, hooks, Arc::new(runtime), Arc::new(FsWorkspace::new(root)))
    }

    /// The backend registry.
    #[must_use]
    pub const fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// The execution driver.
    #[must_use]
    pub const fn driver(&self) -> &ExecutionDriver {
        &self.driver
    }

    /// Selects a backend for `request` and runs compile then execute.
    pub fn simulate(&self, request: &SimulationRequest) -> SimResult<SimulationResult> {
        let span = info_span!("simulate", dut = %request.dut.name);
        let _guard = span.enter();

        let ctx = InvocationContext {
            driver: &self.driver,
            workspace: self.workspace.as_ref(),
        };
        let result = self.registry.dispatch(request, ctx)?;
        info!(backend = %result.backend, exit_code = result.exit_code(), "simulation finished");
        Ok(result)
    }

    /// Builds a request from its parts, then simulates it.
    pub fn simulate_with(
        &self,
        dut: DesignUnderTest,
        compile: CompileOptions,
        execute: ExecuteOptions,
        preferences: UserPreferences,
    ) -> SimResult<SimulationResult> {
        let request = SimulationRequest::builder()
            .dut(dut)
            .compile(compile)
            .execute(execute)
            .preferences(preferences)
            .build()?;
        self.simulate(&request)
    }
}
