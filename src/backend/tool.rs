//! Plan construction shared by every vendor tool.
//!
//! Vendors differ only in data: flags, artifact names and waveform settings.
//! That data lives in a [`ToolProfile`]; [`ToolBackend`] does the layering
//! and command-line projection for all of them.

use tracing::debug;

use crate::backend::{Backend, BackendDescriptor, HookSet};
use crate::config::ToolInstall;
use crate::driver::{CompileResult, ExecutionDriver, STDERR_LOG, STDOUT_LOG};
use crate::error::{SimResult, Stage};
use crate::options::{
    dedup_paths, with_dut_defaults, with_dut_execute_defaults, CompileOptions, ExecuteOptions, Layered, NamedArg,
    ToolCompileOptions, ToolExecuteOptions,
};
use crate::path::WorkPath;
use crate::plan::{GlobOutput, GlobPattern, InvocationPlan, OutputLayout};
use crate::request::SimulationRequest;
use crate::workspace::Workspace;

/// Added to a backend's score when the design asks for its test driver.
pub const TEST_DRIVER_BONUS: f64 = 0.5;

/// Subtracted from waveform-capturing backends, which run slower.
pub const WAVEFORM_COST: f64 = 0.25;

/// Vendor-specific constants of a simulator tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolProfile {
    /// Vendor name, e.g. `synopsys`.
    pub vendor: &'static str,
    /// Tool name, e.g. `vcs`. Also the base backend name.
    pub tool: &'static str,
    /// Test-driver identifier served by this tool.
    pub test_driver: &'static str,
    /// Executable produced by the compile stage.
    pub binary: &'static str,
    /// Header produced by the compile stage.
    pub header: &'static str,
    /// Directory of auxiliary compiled libraries, named by the tool.
    pub aux_dir: &'static str,
    /// Mandatory compile flags.
    pub compile_args: &'static [&'static str],
    /// Mandatory runtime flags.
    pub execute_args: &'static [&'static str],
    /// Extra compile flags when capturing waveforms.
    pub waveform_compile_args: &'static [&'static str],
    /// Macro defined when capturing waveforms.
    pub waveform_define: &'static str,
    /// Runtime argument naming the waveform file.
    pub waveform_plusarg: &'static str,
    /// Waveform file written into the execute directory.
    pub waveform_file: &'static str,
}

/// A backend driving one vendor tool, with or without waveform capture.
#[derive(Debug, Clone)]
pub struct ToolBackend {
    descriptor: BackendDescriptor,
    profile: ToolProfile,
    install: ToolInstall,
    hooks: HookSet,
}

fn rel(path: &WorkPath, run_dir: &WorkPath) -> String {
    path.relative_to(run_dir).to_string()
}

impl ToolBackend {
    /// Creates a backend. Waveform variants are named `<tool>-waves`.
    #[must_use]
    pub fn new(profile: ToolProfile, install: ToolInstall, waveforms: bool, hooks: HookSet) -> Self {
        let name = if waveforms {
            format!("{}-waves", profile.tool)
        } else {
            profile.tool.to_string()
        };
        Self {
            descriptor: BackendDescriptor {
                name,
                vendor: profile.vendor.to_string(),
                test_driver: profile.test_driver.to_string(),
                waveforms,
            },
            profile,
            install,
            hooks,
        }
    }

    /// The vendor profile.
    #[must_use]
    pub const fn profile(&self) -> &ToolProfile {
        &self.profile
    }

    /// Licensed-installation tag, `<vendor>/<tool>/<version>`.
    #[must_use]
    pub fn resource_tag(&self) -> String {
        format!("{}/{}/{}", self.profile.vendor, self.profile.tool, self.install.version)
    }

    fn compile_defaults(&self, request: &SimulationRequest) -> ToolCompileOptions {
        let mut generic = CompileOptions::new().with_resource(self.resource_tag());
        let mut extra: Vec<String> = self.profile.compile_args.iter().map(|a| (*a).to_string()).collect();
        if self.descriptor.waveforms {
            generic = generic.with_define(NamedArg::flag(self.profile.waveform_define));
            extra.extend(self.profile.waveform_compile_args.iter().map(|a| (*a).to_string()));
        }
        extra.push("-top".to_string());
        extra.push(request.dut.top_module.clone());
        ToolCompileOptions {
            options: generic,
            extra_args: extra,
        }
    }

    fn execute_defaults(&self) -> ToolExecuteOptions {
        let mut generic = ExecuteOptions::new().with_resource(self.resource_tag());
        if self.descriptor.waveforms {
            generic = generic.with_plusarg(NamedArg::valued(
                self.profile.waveform_plusarg,
                self.profile.waveform_file,
            ));
        }
        ToolExecuteOptions {
            options: generic,
            extra_args: self.profile.execute_args.iter().map(|a| (*a).to_string()).collect(),
        }
    }

    /// Compile options after every layer: backend defaults, caller options
    /// (with the design's own inputs ahead of them), preference runtime
    /// arguments, then hooks.
    #[must_use]
    pub fn merged_compile(&self, request: &SimulationRequest) -> ToolCompileOptions {
        let caller = ToolCompileOptions::new(with_dut_defaults(&request.dut, &request.compile));
        let user = ToolCompileOptions::new(CompileOptions {
            plusargs: request.preferences.plusargs.clone(),
            ..CompileOptions::default()
        });
        let merged = self.compile_defaults(request).append(&caller).append(&user);
        self.hooks.apply_compile(&request.dut, merged)
    }

    /// Execute options after every layer, in the same order as compile.
    #[must_use]
    pub fn merged_execute(&self, request: &SimulationRequest) -> ToolExecuteOptions {
        let caller = ToolExecuteOptions::new(with_dut_execute_defaults(&request.dut, &request.execute));
        let user = ToolExecuteOptions::new(ExecuteOptions {
            plusargs: request.preferences.plusargs.clone(),
            ..ExecuteOptions::default()
        });
        let merged = self.execute_defaults().append(&caller).append(&user);
        self.hooks.apply_execute(&request.dut, merged)
    }
}

impl Backend for ToolBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn score(&self, request: &SimulationRequest) -> f64 {
        let mut score = self.install.priority;
        if request.dut.test_driver.as_deref() == Some(self.profile.test_driver) {
            score += TEST_DRIVER_BONUS;
        }
        if self.descriptor.waveforms {
            score -= WAVEFORM_COST;
        }
        score
    }

    fn compile_plan(&self, request: &SimulationRequest, workspace: &dyn Workspace) -> SimResult<InvocationPlan> {
        let merged = self.merged_compile(request);
        let opts = &merged.options;
        let out = &request.preferences.compile_dir;
        let sources = dedup_paths(&opts.sources);
        let wrapper = &self.install.compile_wrapper;

        let mut command = vec![rel(wrapper, out)];
        command.extend(opts.include_dirs.iter().map(|d| format!("+incdir+{}", rel(d, out))));
        command.extend(opts.defines.iter().map(NamedArg::to_define));
        command.extend(opts.plusargs.iter().map(NamedArg::to_plusarg));
        command.extend(merged.extra_args.iter().cloned());
        command.extend(sources.iter().map(|s| rel(s, out)));

        let mut inputs = vec![wrapper.clone()];
        inputs.extend(sources);
        for dir in &opts.include_dirs {
            inputs.extend(workspace.files_under(dir)?);
        }
        let inputs = dedup_paths(&inputs);

        let outputs = OutputLayout {
            files: vec![out.join(self.profile.binary), out.join(self.profile.header)],
            globs: vec![GlobOutput {
                dir: out.join(self.profile.aux_dir),
                pattern: GlobPattern::new("**")?,
            }],
        };

        debug!(
            backend = %self.descriptor.name,
            sources = opts.sources.len(),
            inputs = inputs.len(),
            "compile options merged"
        );

        Ok(InvocationPlan {
            stage: Stage::Compile,
            backend: self.descriptor.name.clone(),
            command,
            run_dir: out.clone(),
            inputs,
            output_dir: out.clone(),
            resources: opts.resources.clone(),
            outputs,
            expected_output: Some(self.profile.binary.to_string()),
        })
    }

    fn execute_plan(
        &self,
        request: &SimulationRequest,
        compiled: &CompileResult,
        driver: &ExecutionDriver,
    ) -> SimResult<InvocationPlan> {
        let merged = self.merged_execute(request);
        let opts = &merged.options;
        let out = &request.preferences.execute_dir;
        let logs = driver.logs();
        let wrapper = &self.install.log_wrapper;
        let binary = &compiled.binary.path;

        let mut command = vec![
            rel(wrapper, out),
            STDOUT_LOG.to_string(),
            STDERR_LOG.to_string(),
            logs.stdout_tail_lines.to_string(),
            logs.stderr_tail_lines.to_string(),
            rel(binary, out),
        ];
        command.extend(merged.extra_args.iter().cloned());
        command.extend(opts.plusargs.iter().map(NamedArg::to_plusarg));

        let mut inputs = vec![wrapper.clone(), binary.clone()];
        inputs.extend(compiled.output_paths());
        inputs.extend(opts.visible_files.iter().cloned());
        let inputs = dedup_paths(&inputs);

        let mut files = vec![out.join(STDOUT_LOG), out.join(STDERR_LOG)];
        if self.descriptor.waveforms {
            files.push(out.join(self.profile.waveform_file));
        }

        Ok(InvocationPlan {
            stage: Stage::Execute,
            backend: self.descriptor.name.clone(),
            command,
            run_dir: out.clone(),
            inputs,
            output_dir: out.clone(),
            resources: opts.resources.clone(),
            outputs: OutputLayout {
                files,
                globs: Vec::new(),
            },
            expected_output: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::vcs;
    use crate::config::{LogConfig, ToolsConfig};
    use crate::dut::DesignUnderTest;
    use crate::engine::{ScriptedEngine, ScriptedOutcome};
    use crate::preferences::UserPreferences;
    use crate::workspace::StaticWorkspace;

    fn request() -> SimulationRequest {
        SimulationRequest::builder()
            .dut(
                DesignUnderTest::new("gcd", "GCD")
                    .with_source("rtl/gcd.sv")
                    .with_include_dir("rtl/inc")
                    .with_test_driver(vcs::PROFILE.test_driver),
            )
            .compile(
                CompileOptions::new()
                    .with_source("tb/tb.sv")
                    .with_source("rtl/gcd.sv")
                    .with_define(NamedArg::valued("WIDTH", "16"))
                    .with_resource("caller/tag"),
            )
            .execute(ExecuteOptions::new().with_plusarg(NamedArg::valued("seed", "7")))
            .preferences(UserPreferences::new("build/compile", "build/execute").with_plusarg(NamedArg::flag("verbose")))
            .build()
            .unwrap()
    }

    fn backend(waveforms: bool, hooks: HookSet) -> ToolBackend {
        ToolBackend::new(vcs::PROFILE, ToolsConfig::default().vcs, waveforms, hooks)
    }

    fn workspace() -> StaticWorkspace {
        StaticWorkspace::new(["rtl/inc/defs.svh", "rtl/inc/pkg/types.svh", "rtl/gcd.sv"])
    }

    fn compiled(plan: InvocationPlan) -> CompileResult {
        let engine = Arc::new(ScriptedEngine::new());
        engine
            .push(
                ScriptedOutcome::success()
                    .with_output("simv", "")
                    .with_output("vc_hdrs.h", "")
                    .with_output("simv.daidir/libsim.so", ""),
            )
            .unwrap();
        ExecutionDriver::new(engine, LogConfig::default()).compile(plan).unwrap()
    }

    #[test]
    fn compile_command_follows_flag_order() {
        let plan = backend(false, HookSet::new()).compile_plan(&request(), &workspace()).unwrap();
        assert_eq!(plan.command[0], "../../scripts/vcs-compile");
        assert_eq!(plan.command[1], "+incdir+../../rtl/inc");
        assert_eq!(plan.command[2], "+define+WIDTH=16");
        assert_eq!(plan.command[3], "+verbose");
        let top = plan.command.iter().position(|t| t == "-top").unwrap();
        assert_eq!(plan.command[top + 1], "GCD");
        // Design sources first, duplicates dropped.
        assert_eq!(
            &plan.command[plan.command.len() - 2..],
            &["../../rtl/gcd.sv".to_string(), "../../tb/tb.sv".to_string()]
        );
        assert_eq!(plan.expected_output.as_deref(), Some("simv"));
    }

    #[test]
    fn compile_inputs_include_wrapper_sources_and_include_files() {
        let plan = backend(false, HookSet::new()).compile_plan(&request(), &workspace()).unwrap();
        let inputs: Vec<&str> = plan.inputs.iter().map(WorkPath::as_str).collect();
        assert_eq!(
            inputs,
            vec![
                "scripts/vcs-compile",
                "rtl/gcd.sv",
                "tb/tb.sv",
                "rtl/inc/defs.svh",
                "rtl/inc/pkg/types.svh"
            ]
        );
        assert!(plan.outputs.matches(&WorkPath::new("build/compile/simv")));
        assert!(plan.outputs.matches(&WorkPath::new("build/compile/vc_hdrs.h")));
        assert!(plan.outputs.matches(&WorkPath::new("build/compile/simv.daidir/a/b.so")));
    }

    #[test]
    fn resource_tags_concatenate_across_layers() {
        let plan = backend(false, HookSet::new()).compile_plan(&request(), &workspace()).unwrap();
        assert_eq!(plan.resources, vec!["synopsys/vcs/2023.03", "caller/tag"]);
    }

    #[test]
    fn execute_command_and_inputs() {
        let b = backend(false, HookSet::new());
        let req = request();
        let compiled = compiled(b.compile_plan(&req, &workspace()).unwrap());
        let driver = ExecutionDriver::new(Arc::new(ScriptedEngine::new()), LogConfig::default());
        let plan = b.execute_plan(&req, &compiled, &driver).unwrap();

        assert_eq!(
            &plan.command[..6],
            &["../../scripts/run-logged", "sim.out", "sim.err", "5000", "5000", "../compile/simv"]
        );
        assert_eq!(&plan.command[plan.command.len() - 2..], &["+seed=7", "+verbose"]);
        assert!(plan.inputs.contains(&WorkPath::new("build/compile/simv.daidir/libsim.so")));
        assert!(plan.inputs.contains(&WorkPath::new("scripts/run-logged")));
        assert_eq!(plan.run_dir, WorkPath::new("build/execute"));
    }

    #[test]
    fn waveform_mode_adds_one_define_and_one_plusarg() {
        let req = request();
        let plain = backend(false, HookSet::new());
        let waves = backend(true, HookSet::new());

        let pc = plain.merged_compile(&req).options;
        let mut wc = waves.merged_compile(&req).options;
        assert_eq!(wc.defines.len(), pc.defines.len() + 1);
        assert_eq!(wc.defines.remove(0), NamedArg::flag("DUMP_VPD"));
        assert_eq!(wc, pc);

        let pe = plain.merged_execute(&req).options;
        let mut we = waves.merged_execute(&req).options;
        assert_eq!(we.plusargs.len(), pe.plusargs.len() + 1);
        assert_eq!(we.plusargs.remove(0), NamedArg::valued("vcdplusfile", "waves.vpd"));
        assert_eq!(we, pe);
    }

    #[test]
    fn hooks_run_last() {
        let hooks = HookSet::new().with_compile_hook("strip-defines", |_, mut o: ToolCompileOptions| {
            o.options.defines.clear();
            o
        });
        let merged = backend(true, hooks).merged_compile(&request());
        assert!(merged.options.defines.is_empty());
    }

    #[test]
    fn matching_test_driver_raises_score() {
        let b = backend(false, HookSet::new());
        let with_driver = b.score(&request());
        let mut req = request();
        req.dut.test_driver = None;
        assert_eq!(with_driver - b.score(&req), TEST_DRIVER_BONUS);
        assert!(backend(true, HookSet::new()).score(&req) < b.score(&req));
    }
}
