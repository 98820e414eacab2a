//! Integration tests for the `kumiki` binary using `assert_cmd`.
//!
//! Each command starts from an environment without any `KUMIKI_*` variable
//! and with the cross toolchain disabled, so results do not depend on the
//! machine running the tests.

use std::fs;

use anyhow::{Context, Result, ensure};
use assert_cmd::Command;
use kumiki_env::{CROSS_ENV, LOG_ENV, ROOT_ENV, STRICT_ENV};
use predicates::prelude::*;
use test_support::Project;
use test_support::env_lock::KUMIKI_VARS;

const HINT: &str = "TO BUILD RUN: ninja\n";

fn kumiki() -> Result<Command> {
    let mut cmd = Command::cargo_bin("kumiki").context("locate kumiki binary")?;
    for name in KUMIKI_VARS {
        cmd.env_remove(name);
    }
    cmd.env(CROSS_ENV, "0");
    Ok(cmd)
}

fn sample() -> Result<Project> {
    Project::new()?
        .unit(
            ".",
            "include: [posix]\nbuild:\n  - alias: { name: all, targets: [$dst/posix/app] }\ndefault: [all]\n",
        )?
        .unit(
            "posix",
            "build:\n  - compile: { target: $dst/posix/app, source: $src/posix/main.cc }\n",
        )
}

#[test]
fn writes_build_file_and_prints_hint() -> Result<()> {
    let project = sample()?;
    kumiki()?
        .current_dir(project.path())
        .assert()
        .success()
        .stdout(HINT);
    let ninja = project.read_ninja()?;
    ensure!(ninja.contains("\nbuild $dst/posix/app: compile $src/posix/main.cc\n"));
    ensure!(ninja.contains("\ndefault all\n"));
    ensure!(ninja.contains("\nregen_env = KUMIKI_ROOT=$src KUMIKI_CROSS=0"));
    ensure!(
        ninja.trim_end().ends_with(" $src/BUILD $src/posix/BUILD"),
        "reconfiguration edge must list every unit"
    );
    Ok(())
}

#[test]
fn quiet_suppresses_hint() -> Result<()> {
    let project = sample()?;
    kumiki()?
        .current_dir(project.path())
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    ensure!(project.ninja_file().exists(), "build.ninja should be written");
    Ok(())
}

#[test]
fn out_of_tree_build_uses_relative_root() -> Result<()> {
    let project = sample()?;
    let build_dir = project.root().join("posix/../build-out");
    fs::create_dir_all(&build_dir).context("create build directory")?;
    kumiki()?
        .current_dir(&build_dir)
        .env(ROOT_ENV, "..")
        .arg("--quiet")
        .assert()
        .success();
    let ninja = fs::read_to_string(build_dir.join("build.ninja")).context("read build.ninja")?;
    ensure!(ninja.contains("\nsrc = ..\n"), "src should point at the tree");
    ensure!(ninja.contains("\ndst = .\n"), "outputs go to the build directory");
    Ok(())
}

#[test]
fn failure_leaves_no_build_file() -> Result<()> {
    let project = Project::new()?.unit(".", "include: [ghost]\n")?;
    kumiki()?
        .current_dir(project.path())
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("ghost"));
    ensure!(
        !project.ninja_file().exists(),
        "no build file may be written on failure"
    );
    Ok(())
}

#[test]
fn failure_is_reported_with_logging_off() -> Result<()> {
    let project = Project::new()?;
    kumiki()?
        .current_dir(project.path())
        .env(LOG_ENV, "off")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read declaration unit `$src/BUILD`"));
    Ok(())
}

#[test]
fn failure_keeps_previous_build_file() -> Result<()> {
    let project = Project::new()?.unit(".", "build:\n  - compyle: { target: a, source: b }\n")?;
    fs::write(project.ninja_file(), "# previous\n").context("seed build.ninja")?;
    kumiki()?.current_dir(project.path()).assert().failure();
    ensure!(project.read_ninja()? == "# previous\n", "previous file must survive");
    Ok(())
}

#[test]
fn strict_variables_fail_the_run() -> Result<()> {
    let project = Project::new()?.unit(
        ".",
        "build:\n  - oneshot: { target: deploy, source: app, command: \"$UPLOADER $in\" }\n",
    )?;
    kumiki()?
        .current_dir(project.path())
        .env(STRICT_ENV, "1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("UPLOADER"));
    ensure!(!project.ninja_file().exists());
    Ok(())
}

#[test]
fn invalid_setting_is_reported() -> Result<()> {
    let project = sample()?;
    kumiki()?
        .current_dir(project.path())
        .env("KUMIKI_TOOLCHAIN_SELECT", "newest")
        .assert()
        .failure()
        .stderr(predicate::str::contains("KUMIKI_TOOLCHAIN_SELECT"));
    Ok(())
}
