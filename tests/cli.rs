//! Command line behavior of the `webext_bundler` binary.

mod support;

use assert_cmd::Command;
use predicates::prelude::*;

fn bundler() -> Command {
    let mut cmd = Command::cargo_bin("webext_bundler").unwrap();
    cmd.env_remove("WEBEXT_BUNDLER_BASE_DIR");
    cmd
}

#[test]
fn build_writes_package_and_prints_summary() {
    let src = support::source_tree();

    bundler()
        .arg("-d")
        .arg(src.path())
        .args(["-t", "gecko", "build", "-b", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created:"))
        .stdout(predicate::str::contains("abp-1.2.3.3.xpi"));

    assert!(src.path().join("abp-1.2.3.3.xpi").is_file());
}

#[test]
fn explicit_outfile_is_used() {
    let src = support::source_tree();
    let out = src.path().join("dist/package.zip");

    bundler()
        .arg("-d")
        .arg(src.path())
        .args(["-t", "chrome", "build", "-r"])
        .arg(&out)
        .assert()
        .success();

    assert!(out.is_file());
}

#[test]
fn missing_metadata_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();

    bundler()
        .arg("-d")
        .arg(dir.path())
        .args(["-t", "edge", "build", "-r"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("configuration error"))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn unknown_type_is_rejected() {
    bundler()
        .args(["-t", "opera", "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("opera"));
}
