//! # simdispatch - Simulator backend registry and dispatch
//!
//! simdispatch selects, configures and drives vendor hardware simulators.
//! A request names a design under test plus generic compile and execute
//! options; the registry filters and scores the published backends, and the
//! winner projects the merged options into two invocation plans that an
//! external execution engine runs.
//!
//! ## Core Concepts
//!
//! - **Options**: immutable layers composed with `append` / `prepend`
//! - **Backend**: one vendor tool, with a score and a compile/execute plan builder
//! - **Registry**: publication-ordered backends; filter, then score, then run
//! - **Driver**: submits plans and checks their outputs
//! - **Engine**: the collaborator that actually runs processes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use simdispatch::{BackendSelector, DesignUnderTest, HookSet, SimConfig, Simulator};
//!
//! let config = SimConfig::default();
//! let sim = Simulator::local(&config, HookSet::new(), "/work/checkout")?;
//!
//! let request = simdispatch::SimulationRequest::builder()
//!     .dut(DesignUnderTest::new("gcd", "GCD").with_source("rtl/gcd.sv"))
//!     .preferences(config.preferences().with_filter(BackendSelector::waveforms(true)))
//!     .build()?;
//!
//! let result = sim.simulate(&request)?;
//! println!("{}", result.read_output("sim.out")?);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Values
pub mod config;
pub mod dut;
pub mod error;
pub mod options;
pub mod path;
pub mod preferences;
pub mod request;

// Planning and execution
pub mod driver;
pub mod engine;
pub mod plan;
pub mod result;
pub mod workspace;

// Dispatch
pub mod backend;
pub mod registry;
pub mod simulator;

// Re-export primary types at crate root for convenience
pub use backend::{Backend, BackendDescriptor, HookSet, InvocationContext, ToolBackend, ToolProfile};
pub use config::{LogConfig, RuntimeConfig, SimConfig, ToolInstall, ToolsConfig};
pub use driver::{find_output, CompileResult, ExecuteResult, ExecutionDriver};
pub use dut::DesignUnderTest;
pub use engine::{
    Artifact, EngineError, EngineRuntime, ExecutionEngine, JobOutcome, JobTicket, LocalEngine, ScriptedEngine,
    ScriptedOutcome,
};
pub use error::{
    ConfigError, DispatchError, ExecutionError, JobDiagnostics, SimError, SimResult, Stage, ValidationError,
};
pub use options::{
    append, prepend, with_dut_defaults, CompileOptions, ExecuteOptions, Layered, NamedArg, ToolCompileOptions,
    ToolExecuteOptions,
};
pub use path::WorkPath;
pub use plan::{GlobPattern, InvocationPlan, JobId, OutputLayout};
pub use preferences::{BackendFilter, BackendSelector, UserPreferences};
pub use registry::{BackendRegistry, Candidate, RegistryBuilder};
pub use request::{RequestBuilder, SimulationRequest};
pub use result::{RunSummary, SimulationResult};
pub use simulator::Simulator;
pub use workspace::{FsWorkspace, StaticWorkspace, Workspace};
