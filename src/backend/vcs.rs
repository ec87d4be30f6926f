//! Synopsys VCS.
//!
//! VCS compiles to a standalone `simv` executable with its libraries in
//! `simv.daidir/`, and emits `vc_hdrs.h` for DPI imports.

use crate::backend::{HookSet, ToolBackend, ToolProfile};
use crate::config::ToolInstall;

/// VCS constants.
pub const PROFILE: ToolProfile = ToolProfile {
    vendor: "synopsys",
    tool: "vcs",
    test_driver: "vcs-dpi",
    binary: "simv",
    header: "vc_hdrs.h",
    aux_dir: "simv.daidir",
    compile_args: &["-full64", "-sverilog", "-timescale=1ns/1ps", "-o", "simv"],
    execute_args: &["-q"],
    waveform_compile_args: &["-debug_access+all", "-kdb"],
    waveform_define: "DUMP_VPD",
    waveform_plusarg: "vcdplusfile",
    waveform_file: "waves.vpd",
};

/// A VCS backend.
#[must_use]
pub fn backend(install: ToolInstall, waveforms: bool, hooks: HookSet) -> ToolBackend {
    ToolBackend::new(PROFILE, install, waveforms, hooks)
}
