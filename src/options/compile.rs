//! Compile-time options.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::arg::NamedArg;
use super::{concat, Layered};
use crate::path::WorkPath;

/// Generic compile options shared by every backend.
///
/// Values are immutable in spirit: the `with_*` methods consume and return
/// a new value, and composition goes through [`Layered`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Include directories, in search order.
    pub include_dirs: Vec<WorkPath>,
    /// Macro definitions.
    pub defines: Vec<NamedArg>,
    /// Source files. May contain duplicates; see [`CompileOptions::deduped_sources`].
    pub sources: Vec<WorkPath>,
    /// Runtime arguments baked in at compile time.
    pub plusargs: Vec<NamedArg>,
    /// Resource tags. Never deduplicated.
    pub resources: Vec<String>,
}

impl CompileOptions {
    /// Creates an empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an include directory.
    #[must_use]
    pub fn with_include_dir(mut self, dir: impl Into<WorkPath>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    /// Adds a macro definition.
    #[must_use]
    pub fn with_define(mut self, define: NamedArg) -> Self {
        self.defines.push(define);
        self
    }

    /// Adds a source file.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<WorkPath>) -> Self {
        self.sources.push(source.into());
        self
    }

    /// Adds several source files in order.
    #[must_use]
    pub fn with_sources<I, P>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<WorkPath>,
    {
        self.sources.extend(sources.into_iter().map(Into::into));
        self
    }

    /// Adds a runtime argument.
    #[must_use]
    pub fn with_plusarg(mut self, arg: NamedArg) -> Self {
        self.plusargs.push(arg);
        self
    }

    /// Adds a resource tag.
    #[must_use]
    pub fn with_resource(mut self, tag: impl Into<String>) -> Self {
        self.resources.push(tag.into());
        self
    }

    /// Returns the source list deduplicated by path identity.
    ///
    /// First occurrence wins and relative order is preserved.
    #[must_use]
    pub fn deduped_sources(&self) -> Vec<WorkPath> {
        dedup_paths(&self.sources)
    }
}

impl Layered for CompileOptions {
    fn append(&self, delta: &Self) -> Self {
        Self {
            include_dirs: concat(&self.include_dirs, &delta.include_dirs),
            defines: concat(&self.defines, &delta.defines),
            sources: concat(&self.sources, &delta.sources),
            plusargs: concat(&self.plusargs, &delta.plusargs),
            resources: concat(&self.resources, &delta.resources),
        }
    }

    fn prepend(&self, delta: &Self) -> Self {
        delta.append(self)
    }
}

/// Deduplicates paths by identity, keeping the first occurrence.
#[must_use]
pub fn dedup_paths(paths: &[WorkPath]) -> Vec<WorkPath> {
    let mut seen: HashSet<&WorkPath> = HashSet::with_capacity(paths.len());
    let mut deduped = Vec::with_capacity(paths.len());
    for p in paths {
        if seen.insert(p) {
            deduped.push(p.clone());
        }
    }
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(raw: &[&str]) -> Vec<WorkPath> {
        raw.iter().map(WorkPath::new).collect()
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let opts = CompileOptions::new().with_sources(["a.sv", "b.sv", "a.sv", "c.sv"]);
        assert_eq!(opts.deduped_sources(), paths(&["a.sv", "b.sv", "c.sv"]));
    }

    #[test]
    fn dedup_uses_normalized_identity() {
        let opts = CompileOptions::new().with_sources(["rtl/top.sv", "./rtl//top.sv"]);
        assert_eq!(opts.deduped_sources(), paths(&["rtl/top.sv"]));
    }

    #[test]
    fn append_and_prepend_per_field() {
        let base = CompileOptions::new()
            .with_source("base.sv")
            .with_define(NamedArg::flag("BASE"))
            .with_resource("t1");
        let delta = CompileOptions::new()
            .with_source("delta.sv")
            .with_include_dir("inc")
            .with_resource("t2");

        let appended = base.append(&delta);
        assert_eq!(appended.sources, paths(&["base.sv", "delta.sv"]));
        assert_eq!(appended.include_dirs, paths(&["inc"]));
        assert_eq!(appended.resources, vec!["t1", "t2"]);

        let prepended = base.prepend(&delta);
        assert_eq!(prepended.sources, paths(&["delta.sv", "base.sv"]));
        assert_eq!(prepended.resources, vec!["t2", "t1"]);
        assert_eq!(prepended.defines, vec![NamedArg::flag("BASE")]);
    }

    #[test]
    fn append_does_not_mutate_inputs() {
        let base = CompileOptions::new().with_source("a.sv");
        let delta = CompileOptions::new().with_source("b.sv");
        let _ = base.append(&delta);
        assert_eq!(base.sources.len(), 1);
        assert_eq!(delta.sources.len(), 1);
    }

    #[test]
    fn resources_are_never_deduplicated() {
        let merged = CompileOptions::new()
            .with_resource("synopsys/vcs/2023.03")
            .append(&CompileOptions::new().with_resource("synopsys/vcs/2023.03"));
        assert_eq!(merged.resources.len(), 2);
    }
}
