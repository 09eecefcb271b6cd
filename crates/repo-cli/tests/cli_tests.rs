//! Integration tests for the repo-sync binary.
//!
//! These tests exercise the actual compiled binary using assert_cmd.

use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;
use repo_test_utils::TestTree;
use tempfile::tempdir;

/// Get a Command for the repo-sync binary with an isolated cache root
fn repo_sync(cache: &std::path::Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("repo-sync"));
    cmd.env("GITROOT", cache)
        .env_remove("RUST_LOG")
        .timeout(Duration::from_secs(30));
    cmd
}

#[test]
fn test_help_output() {
    let cache = tempdir().unwrap();
    repo_sync(cache.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--stream-type"))
        .stdout(predicate::str::contains("--gitroot-path"));
}

#[test]
fn test_missing_sources_is_usage_error() {
    let cache = tempdir().unwrap();
    repo_sync(cache.path()).assert().failure();
}

#[test]
fn test_invalid_uri_exits_with_error() {
    let cache = tempdir().unwrap();
    repo_sync(cache.path())
        .args(["--uri", "gopher://example.com/thing"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("unsupported scheme"));
}

#[test]
fn test_ftp_root_path_is_rejected() {
    let cache = tempdir().unwrap();
    repo_sync(cache.path())
        .args(["--uri", "ftp://files.example.com/"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("non-root path"));
}

#[test]
fn test_livestream_on_localdir_is_config_error() {
    let cache = tempdir().unwrap();
    let tree = TestTree::new();
    repo_sync(cache.path())
        .args(["--uri", &tree.uri(), "--stream-type", "livestream"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Livestream"));
}

#[test]
fn test_scp_without_user_is_config_error() {
    let cache = tempdir().unwrap();
    repo_sync(cache.path())
        .args(["--uri", "scp://ssh.example.com/srv/project"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("requires a username"));
}

#[test]
fn test_multiple_mode_needs_two_roots() {
    let cache = tempdir().unwrap();
    let tree = TestTree::new();
    repo_sync(cache.path())
        .args(["--uri", &tree.uri(), "--gitroot", "multiple"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("two roots"));
}

#[test]
fn test_interactive_session_handles_commands() {
    let cache = tempdir().unwrap();
    let tree = TestTree::new();
    tree.write("README.md", "hello");

    repo_sync(cache.path())
        .args(["--uri", &tree.uri()])
        .write_stdin("bogus\n\nstatus\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown command 'bogus'"))
        .stdout(predicate::str::contains("commands: start | status | exit"));
}

#[test]
fn test_end_of_input_shuts_down_cleanly() {
    let cache = tempdir().unwrap();
    let tree = TestTree::new();
    repo_sync(cache.path())
        .args(["--uri", &tree.uri()])
        .write_stdin("")
        .assert()
        .success();
}
