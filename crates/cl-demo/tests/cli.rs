mod common;

use common::{device_available, kernel};
use std::process::{Command, Output};

fn cl_demo(args: &[&std::ffi::OsStr], device: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cl-demo"))
        .args(args)
        .env("CL_DEMO_DEVICE", device)
        .output()
        .expect("failed to spawn cl-demo")
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[test]
fn bad_device_setting_exits_with_failure() {
    let out = cl_demo(&[], "fpga");
    assert!(!out.status.success());
    let stderr = text(&out.stderr);
    assert!(stderr.contains("invalid configuration"), "{stderr}");
    assert!(stderr.contains("fpga"), "{stderr}");
}

#[test]
fn copy_kernel_prints_result_line_and_shuts_down() {
    let path = kernel("test.cl");
    let out = cl_demo(&[path.as_os_str()], "all");
    if !device_available() {
        assert!(!out.status.success());
        return;
    }
    let stdout = text(&out.stdout);
    assert!(out.status.success(), "stderr: {}", text(&out.stderr));
    assert!(stdout.contains("========== Platform 0 =========="));
    assert!(stdout.contains("Actual size of in_buf: "));
    assert!(stdout.contains("Build log:\n"));
    assert!(stdout.contains("CL_KERNEL_WORK_GROUP_SIZE: "));
    assert!(stdout
        .lines()
        .any(|l| l == "1.000000 2.000000 3.000000 4.000000 5.000000 6.000000 7.000000 8.000000"));
    assert!(stdout.trim_end().ends_with("Shut down cleanly"));
}

#[test]
fn syntax_error_exits_with_build_failure() {
    let path = kernel("syntax_error.cl");
    let out = cl_demo(&[path.as_os_str()], "all");
    assert!(!out.status.success());
    if !device_available() {
        return;
    }
    assert!(text(&out.stdout).contains("Build log:\n"));
    assert!(text(&out.stderr).contains("Compilation error"));
}

#[test]
fn missing_kernel_file_exits_with_os_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.cl");
    let out = cl_demo(&[path.as_os_str()], "all");
    assert!(!out.status.success());
    if !device_available() {
        return;
    }
    let stderr = text(&out.stderr);
    assert!(stderr.contains("failed to open"), "{stderr}");
    assert!(stderr.contains("absent.cl"), "{stderr}");
    assert!(stderr.contains("errno = "), "{stderr}");
}
