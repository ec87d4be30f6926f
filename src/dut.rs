//! Design-under-test description.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::options::{CompileOptions, ExecuteOptions, NamedArg};
use crate::path::WorkPath;

/// The hardware design being simulated.
///
/// Carries the inputs that every simulation of this design needs regardless
/// of backend. They are injected ahead of caller options by
/// [`crate::options::with_dut_defaults`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignUnderTest {
    /// Stable design name, used by dynamic hooks to key adjustments.
    pub name: String,
    /// Top-level module.
    pub top_module: String,
    /// Always-required source files.
    #[serde(default)]
    pub sources: Vec<WorkPath>,
    /// Always-required include directories.
    #[serde(default)]
    pub include_dirs: Vec<WorkPath>,
    /// Always-required macro definitions.
    #[serde(default)]
    pub defines: Vec<NamedArg>,
    /// Files the running simulation reads (memory images, configs).
    #[serde(default)]
    pub visible_files: Vec<WorkPath>,
    /// Test driver this design was built against, if it has a preference.
    #[serde(default)]
    pub test_driver: Option<String>,
}

impl DesignUnderTest {
    /// Creates a design with no intrinsic inputs.
    #[must_use]
    pub fn new(name: impl Into<String>, top_module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            top_module: top_module.into(),
            sources: Vec::new(),
            include_dirs: Vec::new(),
            defines: Vec::new(),
            visible_files: Vec::new(),
            test_driver: None,
        }
    }

    /// Adds an always-required source file.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<WorkPath>) -> Self {
        self.sources.push(source.into());
        self
    }

    /// Adds an always-required include directory.
    #[must_use]
    pub fn with_include_dir(mut self, dir: impl Into<WorkPath>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    /// Adds an always-required macro definition.
    #[must_use]
    pub fn with_define(mut self, define: NamedArg) -> Self {
        self.defines.push(define);
        self
    }

    /// Adds a file the running simulation reads.
    #[must_use]
    pub fn with_visible_file(mut self, file: impl Into<WorkPath>) -> Self {
        self.visible_files.push(file.into());
        self
    }

    /// Sets the preferred test driver.
    #[must_use]
    pub fn with_test_driver(mut self, driver: impl Into<String>) -> Self {
        self.test_driver = Some(driver.into());
        self
    }

    /// Compile inputs intrinsic to this design.
    #[must_use]
    pub fn compile_defaults(&self) -> CompileOptions {
        CompileOptions {
            include_dirs: self.include_dirs.clone(),
            defines: self.defines.clone(),
            sources: self.sources.clone(),
            plusargs: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Execute inputs intrinsic to this design.
    #[must_use]
    pub fn execute_defaults(&self) -> ExecuteOptions {
        ExecuteOptions {
            plusargs: Vec::new(),
            visible_files: self.visible_files.clone(),
            resources: Vec::new(),
        }
    }
}

impl fmt::Display for DesignUnderTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.top_module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_defaults_carry_sources_includes_and_defines() {
        let dut = DesignUnderTest::new("gcd", "GCD")
            .with_source("rtl/gcd.sv")
            .with_include_dir("rtl")
            .with_define(NamedArg::valued("WIDTH", "16"));
        let defaults = dut.compile_defaults();
        assert_eq!(defaults.sources, vec![WorkPath::new("rtl/gcd.sv")]);
        assert_eq!(defaults.include_dirs, vec![WorkPath::new("rtl")]);
        assert_eq!(defaults.defines.len(), 1);
        assert!(defaults.resources.is_empty());
    }

    #[test]
    fn deserializes_minimal_design() {
        let dut: DesignUnderTest =
            serde_json::from_str(r#"{"name":"gcd","top_module":"GCD"}"#).unwrap();
        assert_eq!(dut.to_string(), "gcd (GCD)");
        assert!(dut.test_driver.is_none());
    }
}
