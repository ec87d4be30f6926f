//! Cadence Xcelium.
//!
//! `xrun -elaborate` leaves a snapshot in `xcelium.d/`; the compile wrapper
//! writes an `xrun-sim` launcher next to it so the execute stage can treat
//! Xcelium like any other simulator binary.

use crate::backend::{HookSet, ToolBackend, ToolProfile};
use crate::config::ToolInstall;

/// Xcelium constants.
pub const PROFILE: ToolProfile = ToolProfile {
    vendor: "cadence",
    tool: "xcelium",
    test_driver: "xcelium-dpi",
    binary: "xrun-sim",
    header: "xcelium_dpi.h",
    aux_dir: "xcelium.d",
    compile_args: &["-64bit", "-elaborate", "-sv", "-dpiheader", "xcelium_dpi.h"],
    execute_args: &["-nostdout"],
    waveform_compile_args: &["-access", "+rwc"],
    waveform_define: "DUMP_SHM",
    waveform_plusarg: "shm_file",
    waveform_file: "waves.shm",
};

/// An Xcelium backend.
#[must_use]
pub fn backend(install: ToolInstall, waveforms: bool, hooks: HookSet) -> ToolBackend {
    ToolBackend::new(PROFILE, install, waveforms, hooks)
}
