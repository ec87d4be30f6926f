//! Execute-time options.

use serde::{Deserialize, Serialize};

use super::arg::NamedArg;
use super::{concat, Layered};
use crate::path::WorkPath;

/// Generic execute options shared by every backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecuteOptions {
    /// Runtime arguments passed to the compiled binary.
    pub plusargs: Vec<NamedArg>,
    /// Extra files the running simulation must be able to see.
    pub visible_files: Vec<WorkPath>,
    /// Resource tags. Never deduplicated.
    pub resources: Vec<String>,
}

impl ExecuteOptions {
    /// Creates an empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a runtime argument.
    #[must_use]
    pub fn with_plusarg(mut self, arg: NamedArg) -> Self {
        self.plusargs.push(arg);
        self
    }

    /// Adds a visible input file.
    #[must_use]
    pub fn with_visible_file(mut self, file: impl Into<WorkPath>) -> Self {
        self.visible_files.push(file.into());
        self
    }

    /// Adds a resource tag.
    #[must_use]
    pub fn with_resource(mut self, tag: impl Into<String>) -> Self {
        self.resources.push(tag.into());
        self
    }
}

impl Layered for ExecuteOptions {
    fn append(&self, delta: &Self) -> Self {
        Self {
            plusargs: concat(&self.plusargs, &delta.plusargs),
            visible_files: concat(&self.visible_files, &delta.visible_files),
            resources: concat(&self.resources, &delta.resources),
        }
    }

    fn prepend(&self, delta: &Self) -> Self {
        delta.append(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_concatenates_every_field() {
        let base = ExecuteOptions::new()
            .with_plusarg(NamedArg::valued("seed", "1"))
            .with_visible_file("mem/init.hex");
        let delta = ExecuteOptions::new()
            .with_plusarg(NamedArg::flag("verbose"))
            .with_resource("cadence/xcelium/23.09");

        let merged = base.append(&delta);
        assert_eq!(
            merged.plusargs,
            vec![NamedArg::valued("seed", "1"), NamedArg::flag("verbose")]
        );
        assert_eq!(merged.visible_files, vec![WorkPath::new("mem/init.hex")]);
        assert_eq!(merged.resources, vec!["cadence/xcelium/23.09"]);
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let opts: ExecuteOptions =
            serde_json::from_str(r#"{"plusargs":[{"name":"seed","value":"9"}]}"#).unwrap();
        assert_eq!(opts.plusargs, vec![NamedArg::valued("seed", "9")]);
        assert!(opts.visible_files.is_empty());
    }
}
