//! Backend-private option sets.
//!
//! Each backend works on the generic options plus raw vendor arguments
//! that only it knows how to interpret. Dynamic hooks rewrite these.

use serde::{Deserialize, Serialize};

use super::{concat, CompileOptions, ExecuteOptions, Layered};

/// Compile options as seen by a single backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCompileOptions {
    /// Generic options.
    pub options: CompileOptions,
    /// Vendor arguments placed after the generic flags, before sources.
    pub extra_args: Vec<String>,
}

impl ToolCompileOptions {
    /// Wraps generic options with no extra arguments.
    #[must_use]
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            extra_args: Vec::new(),
        }
    }

    /// Adds a vendor argument.
    #[must_use]
    pub fn with_extra_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Replaces the generic part, keeping vendor arguments.
    #[must_use]
    pub fn map_options(self, f: impl FnOnce(CompileOptions) -> CompileOptions) -> Self {
        Self {
            options: f(self.options),
            extra_args: self.extra_args,
        }
    }
}

impl Layered for ToolCompileOptions {
    fn append(&self, delta: &Self) -> Self {
        Self {
            options: self.options.append(&delta.options),
            extra_args: concat(&self.extra_args, &delta.extra_args),
        }
    }

    fn prepend(&self, delta: &Self) -> Self {
        delta.append(self)
    }
}

/// Execute options as seen by a single backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolExecuteOptions {
    /// Generic options.
    pub options: ExecuteOptions,
    /// Vendor arguments placed between the binary path and the plusargs.
    pub extra_args: Vec<String>,
}

impl ToolExecuteOptions {
    /// Wraps generic options with no extra arguments.
    #[must_use]
    pub fn new(options: ExecuteOptions) -> Self {
        Self {
            options,
            extra_args: Vec::new(),
        }
    }

    /// Adds a vendor argument.
    #[must_use]
    pub fn with_extra_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Replaces the generic part, keeping vendor arguments.
    #[must_use]
    pub fn map_options(self, f: impl FnOnce(ExecuteOptions) -> ExecuteOptions) -> Self {
        Self {
            options: f(self.options),
            extra_args: self.extra_args,
        }
    }
}

impl Layered for ToolExecuteOptions {
    fn append(&self, delta: &Self) -> Self {
        Self {
            options: self.options.append(&delta.options),
            extra_args: concat(&self.extra_args, &delta.extra_args),
        }
    }

    fn prepend(&self, delta: &Self) -> Self {
        delta.append(self)
    }
}
