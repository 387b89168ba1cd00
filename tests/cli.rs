//! Binary-level checks that never reach an external tool.

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("bundle_relocate").unwrap();
    for var in [
        "QT_ROOT",
        "WITH_TRANSLATIONS",
        "WITH_SERVER",
        "SKIP_CHECKS",
        "ALLOW_DISTRUSTED_TOOLKIT",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn help_lists_pipeline_flags() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--qt-root"))
        .stdout(predicate::str::contains("--allow-distrusted-toolkit"))
        .stdout(predicate::str::contains("QT_ROOT"));
}

#[test]
fn explicit_missing_config_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .args(["--source"])
        .arg(dir.path())
        .args(["--config"])
        .arg(dir.path().join("missing.toml"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn missing_version_variables_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("CMakeLists.txt"), "project(App)\n").unwrap();
    cmd()
        .args(["--source"])
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("APP_MAJOR_VERSION"));
}

#[test]
fn malformed_manifest_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bundle.toml"), "[app\nname = ").unwrap();
    cmd()
        .args(["--source"])
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("TOML error"));
}
