//! Simulation requests.
//!
//! A request is built once per call and handed to the dispatcher unchanged.

use crate::dut::DesignUnderTest;
use crate::error::ValidationError;
use crate::options::{CompileOptions, ExecuteOptions};
use crate::path::WorkPath;
use crate::preferences::UserPreferences;

/// Everything needed to pick a backend and run one simulation.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    /// Design to simulate.
    pub dut: DesignUnderTest,
    /// Generic compile options from the caller.
    pub compile: CompileOptions,
    /// Generic execute options from the caller.
    pub execute: ExecuteOptions,
    /// User preferences.
    pub preferences: UserPreferences,
}

impl SimulationRequest {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }
}

/// Builder for [`SimulationRequest`].
///
/// # Example
/// ```rust,ignore
/// let request = SimulationRequest::builder()
///     .dut(DesignUnderTest::new("gcd", "GCD").with_source("rtl/gcd.sv"))
///     .compile(CompileOptions::new().with_define(NamedArg::flag("ASSERTIONS")))
///     .execute(ExecuteOptions::new().with_plusarg(NamedArg::valued("seed", "7")))
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    dut: Option<DesignUnderTest>,
    compile: CompileOptions,
    execute: ExecuteOptions,
    preferences: UserPreferences,
}

impl RequestBuilder {
    /// Creates a builder with default preferences.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the design under test (required).
    #[must_use]
    pub fn dut(mut self, dut: DesignUnderTest) -> Self {
        self.dut = Some(dut);
        self
    }

    /// Set the generic compile options (default: empty).
    #[must_use]
    pub fn compile(mut self, compile: CompileOptions) -> Self {
        self.compile = compile;
        self
    }

    /// Set the generic execute options (default: empty).
    #[must_use]
    pub fn execute(mut self, execute: ExecuteOptions) -> Self {
        self.execute = execute;
        self
    }

    /// Set user preferences (default: any backend, default directories).
    #[must_use]
    pub fn preferences(mut self, preferences: UserPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Build the request.
    ///
    /// Returns `ValidationError::MissingField` if the design is unset or has
    /// an empty name or top module, `PathEscapesRoot` if an output directory
    /// climbs above the workspace, and `SharedOutputDir` if both stages would
    /// write to the same directory.
    pub fn build(self) -> Result<SimulationRequest, ValidationError> {
        let dut = self.dut.ok_or_else(|| ValidationError::MissingField {
            field: "dut".to_string(),
        })?;

        if dut.name.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "dut.name".to_string(),
            });
        }
        if dut.top_module.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "dut.top_module".to_string(),
            });
        }

        let prefs = &self.preferences;
        validate_output_dir("preferences.compile_dir", &prefs.compile_dir)?;
        validate_output_dir("preferences.execute_dir", &prefs.execute_dir)?;
        if prefs.compile_dir == prefs.execute_dir {
            return Err(ValidationError::SharedOutputDir {
                dir: prefs.compile_dir.to_string(),
            });
        }

        Ok(SimulationRequest {
            dut,
            compile: self.compile,
            execute: self.execute,
            preferences: self.preferences,
        })
    }
}

fn validate_output_dir(field: &str, dir: &WorkPath) -> Result<(), ValidationError> {
    if dir.as_str() == "." {
        return Err(ValidationError::MissingField {
            field: field.to_string(),
        });
    }
    if dir.escapes_root() {
        return Err(ValidationError::PathEscapesRoot {
            path: dir.to_string(),
        });
    }
    Ok(())
}
