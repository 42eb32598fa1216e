//! Integration tests for spexpack

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;
use tempfile::TempDir;
use which::which;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

fn spexpack_cmd() -> Command {
    let mut cmd = cargo_bin_cmd!("spexpack");
    cmd.env("SPEXPACK_CONFIG", fixture_path("spexpack.toml"));
    cmd
}

fn git_available() -> bool {
    which("git").is_ok()
}

fn git(repo: &Path, args: &[&str]) {
    let status = StdCommand::new("git")
        .arg("-C")
        .arg(repo)
        .args(["-c", "user.email=test@example.com", "-c", "user.name=test"])
        .args(args)
        .status()
        .expect("failed to run git");
    assert!(status.success(), "git {:?} failed", args);
}

#[test]
fn test_version_flag() {
    spexpack_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("spexpack"));
}

#[test]
fn test_help() {
    spexpack_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Spexpack is a CLI tool"));
}

#[test]
fn test_invalid_command() {
    spexpack_cmd().arg("invalid").assert().failure();
}

#[test]
fn test_show_summary() {
    spexpack_cmd()
        .arg("show")
        .arg(fixture_path("pyproject.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("pyspex"))
        .stdout(predicate::str::contains("h5py"));
}

#[test]
fn test_show_json() {
    spexpack_cmd()
        .args(["show", "--json"])
        .arg(fixture_path("pyproject.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"requires-python\""))
        .stdout(predicate::str::contains("\"pyspex\""));
}

#[test]
fn test_show_missing_manifest_fails() {
    spexpack_cmd()
        .arg("show")
        .arg(fixture_path("does-not-exist.toml"))
        .assert()
        .failure();
}

#[test]
fn test_check_clean_manifest() {
    spexpack_cmd()
        .arg("check")
        .arg(fixture_path("pyproject.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("is clean"));
}

#[test]
fn test_check_partition_gap_fails() {
    spexpack_cmd()
        .arg("check")
        .arg(fixture_path("gap").join("pyproject.toml"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("marker-partition"))
        .stdout(predicate::str::contains("gap"));
}

#[test]
fn test_check_recursive_over_fixture_tree() {
    spexpack_cmd()
        .args(["check", "--recursive"])
        .arg(fixtures_dir())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Summary"))
        .stdout(predicate::str::contains("3 manifests"));
}

#[test]
fn test_resolve_python_39_selects_pinned_branch() {
    spexpack_cmd()
        .args(["resolve", "--python", "3.9"])
        .arg(fixture_path("pyproject.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains(">=3.5,<3.8"))
        .stdout(predicate::str::contains("numpy"));
}

#[test]
fn test_resolve_python_310_selects_open_branch() {
    spexpack_cmd()
        .args(["resolve", "--python", "3.10"])
        .arg(fixture_path("pyproject.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains(">=3.8"))
        .stdout(predicate::str::contains("5 selected"));
}

#[test]
fn test_resolve_json_output() {
    spexpack_cmd()
        .args(["resolve", "--python", "3.9", "--json"])
        .arg(fixture_path("pyproject.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"python\": \"3.9\""))
        .stdout(predicate::str::contains("\"h5py\""));
}

#[test]
fn test_resolve_partition_gap_fails() {
    spexpack_cmd()
        .args(["resolve", "--python", "3.10"])
        .arg(fixture_path("gap").join("pyproject.toml"))
        .assert()
        .failure();
}

#[test]
fn test_resolve_rejects_bad_interpreter() {
    spexpack_cmd()
        .args(["resolve", "--python", "snake"])
        .arg(fixture_path("pyproject.toml"))
        .assert()
        .failure();
}

#[test]
fn test_version_static_manifest() {
    spexpack_cmd()
        .arg("version")
        .arg(fixture_path("static").join("pyproject.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("2.3.1"));
}

#[test]
fn test_version_from_exact_tag() {
    if !git_available() {
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    let repo = temp_dir.path();
    fs::copy(fixture_path("pyproject.toml"), repo.join("pyproject.toml")).unwrap();
    git(repo, &["init", "-q"]);
    git(repo, &["add", "pyproject.toml"]);
    git(repo, &["commit", "-q", "-m", "initial"]);
    git(repo, &["tag", "v1.2.3"]);

    spexpack_cmd()
        .arg("version")
        .arg(repo)
        .assert()
        .success()
        .stdout(predicate::str::contains("1.2.3"));
}

#[test]
fn test_version_past_tag_is_dev_release() {
    if !git_available() {
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    let repo = temp_dir.path();
    fs::copy(fixture_path("pyproject.toml"), repo.join("pyproject.toml")).unwrap();
    git(repo, &["init", "-q"]);
    git(repo, &["add", "pyproject.toml"]);
    git(repo, &["commit", "-q", "-m", "initial"]);
    git(repo, &["tag", "v1.2.3"]);
    git(repo, &["commit", "-q", "--allow-empty", "-m", "later"]);

    // short form by default, local tail only with --full
    spexpack_cmd()
        .arg("version")
        .arg(repo)
        .assert()
        .success()
        .stdout(predicate::str::contains("1.2.4.dev1"))
        .stdout(predicate::str::contains("+g").not());

    spexpack_cmd()
        .args(["version", "--full"])
        .arg(repo)
        .assert()
        .success()
        .stdout(predicate::str::contains("+g"));
}

#[test]
fn test_version_outside_repository_fails() {
    let temp_dir = TempDir::new().unwrap();
    fs::copy(
        fixture_path("pyproject.toml"),
        temp_dir.path().join("pyproject.toml"),
    )
    .unwrap();

    spexpack_cmd()
        .arg("version")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Version resolution failed"));
}

#[test]
fn test_init_creates_manifest() {
    let temp_dir = TempDir::new().unwrap();

    spexpack_cmd()
        .arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .success();

    let created = temp_dir.path().join("pyproject.toml");
    assert!(created.is_file());
    let content = fs::read_to_string(created).unwrap();
    assert!(content.contains("[project]"));
    assert!(content.contains("dynamic = [\"version\"]"));
}

#[test]
fn test_init_then_check_passes() {
    let temp_dir = TempDir::new().unwrap();

    spexpack_cmd()
        .arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .success();

    spexpack_cmd()
        .arg("check")
        .arg(temp_dir.path().join("pyproject.toml"))
        .assert()
        .success();
}

#[test]
fn test_config_path_honors_env_override() {
    spexpack_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("spexpack.toml"));
}

#[test]
fn test_config_show() {
    spexpack_cmd()
        .args(["config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration"));
}
