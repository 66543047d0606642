//! Argument parsing and configuration errors.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

pub fn bootstrapper(home: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bootstrapper"));
    cmd.env("NO_COLOR", "1")
        .env("HOME", home.path())
        .env("BOOTSTRAPPER_CONFIG", home.path().join("config.yaml"))
        .env_remove("BOOTSTRAPPER_REPO")
        .env_remove("BOOTSTRAPPER_KEY")
        .env_remove("BOOTSTRAPPER_UNATTENDED")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_core_flags() {
    let home = TempDir::new().expect("tempdir");
    bootstrapper(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--repo"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--unattended"));
}

#[test]
fn test_version_flag_shows_version() {
    let home = TempDir::new().expect("tempdir");
    bootstrapper(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bootstrapper"));
}

#[test]
fn test_missing_repo_is_usage_error() {
    let home = TempDir::new().expect("tempdir");
    bootstrapper(&home)
        .arg("--dry-run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--repo"));
}

#[test]
fn test_key_without_pub_suffix_is_usage_error() {
    let home = TempDir::new().expect("tempdir");
    bootstrapper(&home)
        .args(["--dry-run", "-r", "git@git.example.com:ops/setup.git", "-k", "~/.ssh/id_work"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(".pub"));
}

#[test]
fn test_install_flags_conflict() {
    let home = TempDir::new().expect("tempdir");
    bootstrapper(&home)
        .args(["-r", "git@git.example.com:ops/setup.git", "--auto-install", "--no-install"])
        .assert()
        .code(2);
}

#[test]
fn test_malformed_config_file_is_reported() {
    let home = TempDir::new().expect("tempdir");
    std::fs::write(home.path().join("config.yaml"), "repo: [unterminated\n").expect("write");
    bootstrapper(&home)
        .arg("--dry-run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot parse"));
}
