#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use simdispatch::{
    CompileOptions, DesignUnderTest, ExecuteOptions, ExecutionError, HookSet, NamedArg, SimConfig, SimError,
    SimulationRequest, Simulator, Stage,
};

const LOG_WRAPPER: &str = r#"#!/bin/sh
out=$1; err=$2; nout=$3; nerr=$4; bin=$5
shift 5
"$bin" "$@" > "$out.full" 2> "$err.full"
status=$?
tail -n "$nout" "$out.full" > "$out"
tail -n "$nerr" "$err.full" > "$err"
rm -f "$out.full" "$err.full"
exit $status
"#;

fn compile_wrapper(simv_body: &str) -> String {
    format!(
        "#!/bin/sh\n\
         cat > simv <<'EOS'\n#!/bin/sh\n{simv_body}\nEOS\n\
         chmod +x simv\n\
         touch vc_hdrs.h\n\
         mkdir -p simv.daidir && touch simv.daidir/libsim.so\n\
         echo \"$@\" > compile.args\n"
    )
}

fn write_script(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn checkout(simv_body: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_script(root, "scripts/run-logged", LOG_WRAPPER);
    write_script(root, "scripts/vcs-compile", &compile_wrapper(simv_body));
    fs::create_dir_all(root.join("rtl/inc")).unwrap();
    fs::write(root.join("rtl/gcd.sv"), "module GCD; endmodule\n").unwrap();
    fs::write(root.join("rtl/inc/defs.svh"), "`define W 8\n").unwrap();
    dir
}

fn request() -> SimulationRequest {
    SimulationRequest::builder()
        .dut(
            DesignUnderTest::new("gcd", "GCD")
                .with_source("rtl/gcd.sv")
                .with_include_dir("rtl/inc"),
        )
        .compile(CompileOptions::new().with_define(NamedArg::valued("WIDTH", "8")))
        .execute(ExecuteOptions::new().with_plusarg(NamedArg::valued("seed", "5")))
        .preferences(SimConfig::default().preferences())
        .build()
        .unwrap()
}

#[test]
fn local_run_produces_logs_and_summary() {
    let dir = checkout("echo \"args: $*\"\necho 'TEST PASSED'");
    let sim = Simulator::local(&SimConfig::default(), HookSet::new(), dir.path()).unwrap();

    let result = sim.simulate(&request()).unwrap();
    assert_eq!(result.backend, "vcs");
    let stdout = result.read_output("sim.out").unwrap();
    assert!(stdout.contains("+seed=5"), "stdout was {stdout:?}");
    assert!(stdout.contains("TEST PASSED"));

    let compile_args = fs::read_to_string(dir.path().join("build/sim/compile/compile.args")).unwrap();
    assert!(compile_args.contains("+incdir+../../../rtl/inc"));
    assert!(compile_args.contains("+define+WIDTH=8"));
    assert!(compile_args.trim_end().ends_with("../../../rtl/gcd.sv"));

    assert!(result
        .compile
        .output_paths()
        .iter()
        .any(|p| p.as_str() == "build/sim/compile/simv.daidir/libsim.so"));
    assert!(result.summary().to_json().unwrap().contains("\"backend\": \"vcs\""));
}

#[test]
fn log_tail_limit_is_applied_by_the_wrapper() {
    let dir = checkout("echo one\necho two\necho three");
    let config = SimConfig::from_json_str(r#"{"logs":{"stdout_tail_lines":1}}"#).unwrap();
    let sim = Simulator::local(&config, HookSet::new(), dir.path()).unwrap();

    let result = sim.simulate(&request()).unwrap();
    assert_eq!(result.read_output("sim.out").unwrap(), "three\n");
}

#[test]
fn failing_simulation_reports_captured_stderr() {
    let dir = checkout("echo 'Error: assertion failed' >&2\nexit 3");
    let sim = Simulator::local(&SimConfig::default(), HookSet::new(), dir.path()).unwrap();

    let err = sim.simulate(&request()).unwrap_err();
    let SimError::Execution(ExecutionError::JobFailed {
        stage,
        exit_code,
        diagnostics,
    }) = err
    else {
        panic!("expected JobFailed, got {err:?}");
    };
    assert_eq!(stage, Stage::Execute);
    assert_eq!(exit_code, 3);
    assert!(diagnostics.read_output("sim.err").unwrap().contains("assertion failed"));
}

#[test]
fn compile_without_binary_is_reported() {
    let dir = checkout("exit 0");
    write_script(dir.path(), "scripts/vcs-compile", "#!/bin/sh\ntouch vc_hdrs.h\n");
    let sim = Simulator::local(&SimConfig::default(), HookSet::new(), dir.path()).unwrap();

    let err = sim.simulate(&request()).unwrap_err();
    assert!(matches!(
        err,
        SimError::Execution(ExecutionError::CompileArtifactMissing { ref binary, .. }) if binary == "simv"
    ));
}

#[test]
fn binary_from_an_earlier_run_is_not_reused() {
    let dir = checkout("echo 'OLD BINARY'");
    let sim = Simulator::local(&SimConfig::default(), HookSet::new(), dir.path()).unwrap();
    let first = sim.simulate(&request()).unwrap();
    assert_eq!(first.read_output("sim.out").unwrap(), "OLD BINARY\n");

    // The compile wrapper now exits cleanly without building simv.
    write_script(dir.path(), "scripts/vcs-compile", "#!/bin/sh\ntouch vc_hdrs.h\n");
    let err = sim.simulate(&request()).unwrap_err();
    assert!(matches!(
        err,
        SimError::Execution(ExecutionError::CompileArtifactMissing { ref binary, .. }) if binary == "simv"
    ));
    assert!(!dir.path().join("build/sim/compile/simv").exists());
}

#[test]
fn missing_source_is_an_engine_error() {
    let dir = checkout("exit 0");
    fs::remove_file(dir.path().join("rtl/gcd.sv")).unwrap();
    let sim = Simulator::local(&SimConfig::default(), HookSet::new(), dir.path()).unwrap();

    let err = sim.simulate(&request()).unwrap_err();
    assert!(err.is_execution());
    assert!(err.to_string().contains("rtl/gcd.sv"));
}
