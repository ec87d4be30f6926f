//! Layered option model.
//!
//! Options are plain values composed with two order-preserving operators:
//! `append` yields `base ++ delta` per field and `prepend` yields
//! `delta ++ base` per field. Neither operator mutates its inputs.

/// Named, optionally valued arguments.
pub mod arg;
/// Generic compile options.
pub mod compile;
/// Generic execute options.
pub mod execute;
/// Backend-private option sets.
pub mod tool;

pub use arg::NamedArg;
pub use compile::{dedup_paths, CompileOptions};
pub use execute::ExecuteOptions;
pub use tool::{ToolCompileOptions, ToolExecuteOptions};

use crate::dut::DesignUnderTest;

/// Order-preserving composition of option layers.
pub trait Layered: Sized {
    /// Returns `self ++ delta` for every field.
    #[must_use]
    fn append(&self, delta: &Self) -> Self;

    /// Returns `delta ++ self` for every field.
    #[must_use]
    fn prepend(&self, delta: &Self) -> Self;
}

/// `append(delta, base)`: every field of `base` followed by the same field of `delta`.
#[must_use]
pub fn append<T: Layered>(delta: &T, base: &T) -> T {
    base.append(delta)
}

/// `prepend(delta, base)`: every field of `delta` followed by the same field of `base`.
#[must_use]
pub fn prepend<T: Layered>(delta: &T, base: &T) -> T {
    base.prepend(delta)
}

/// Injects the design's intrinsic compile inputs ahead of `base`.
#[must_use]
pub fn with_dut_defaults(dut: &DesignUnderTest, base: &CompileOptions) -> CompileOptions {
    base.prepend(&dut.compile_defaults())
}

/// Injects the design's intrinsic runtime inputs ahead of `base`.
#[must_use]
pub fn with_dut_execute_defaults(dut: &DesignUnderTest, base: &ExecuteOptions) -> ExecuteOptions {
    base.prepend(&dut.execute_defaults())
}

pub(crate) fn concat<T: Clone>(head: &[T], tail: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(head.len() + tail.len());
    out.extend_from_slice(head);
    out.extend_from_slice(tail);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::WorkPath;

    #[test]
    fn free_functions_follow_delta_base_argument_order() {
        let base = ExecuteOptions::new().with_resource("base");
        let delta = ExecuteOptions::new().with_resource("delta");
        assert_eq!(append(&delta, &base).resources, vec!["base", "delta"]);
        assert_eq!(prepend(&delta, &base).resources, vec!["delta", "base"]);
    }

    #[test]
    fn dut_sources_precede_caller_sources() {
        let dut = DesignUnderTest::new("soc", "TestHarness")
            .with_source("rtl/soc.sv")
            .with_include_dir("rtl/include");
        let caller = CompileOptions::new().with_source("tb/extra.sv");

        let merged = with_dut_defaults(&dut, &caller);
        assert_eq!(
            merged.sources,
            vec![WorkPath::new("rtl/soc.sv"), WorkPath::new("tb/extra.sv")]
        );
        assert_eq!(merged.include_dirs, vec![WorkPath::new("rtl/include")]);
    }

    #[test]
    fn dut_visible_files_precede_caller_files() {
        let dut = DesignUnderTest::new("soc", "TestHarness").with_visible_file("mem/boot.hex");
        let caller = ExecuteOptions::new().with_visible_file("tests/prog.elf");
        let merged = with_dut_execute_defaults(&dut, &caller);
        assert_eq!(
            merged.visible_files,
            vec![WorkPath::new("mem/boot.hex"), WorkPath::new("tests/prog.elf")]
        );
    }
}
