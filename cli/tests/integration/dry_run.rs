//! Dry runs on a fresh machine: everything is described, nothing is touched.

#![allow(clippy::expect_used)]

use predicates::prelude::*;
use tempfile::TempDir;

use crate::cli_tests::bootstrapper;

const REPO: &str = "git@git.example.com:ops/setup-private.git";

#[test]
fn test_dry_run_on_fresh_machine_exits_zero_and_writes_nothing() {
    let home = TempDir::new().expect("tempdir");

    bootstrapper(&home)
        .args(["--dry-run", "--unattended", "-r", REPO, "--", "--role", "web"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[dry-run]"))
        .stdout(predicate::str::contains("would run: git clone"))
        .stdout(predicate::str::contains("--role web"));

    assert!(!home.path().join(".ssh").exists());
    assert!(!home.path().join("setup-private").exists());
}

#[test]
fn test_dry_run_reads_repo_from_config_file() {
    let home = TempDir::new().expect("tempdir");
    std::fs::write(
        home.path().join("config.yaml"),
        format!("repo: {REPO}\ntag: v1.0.0\n"),
    )
    .expect("write config");

    bootstrapper(&home)
        .args(["--dry-run", "--unattended"])
        .assert()
        .success()
        .stdout(predicate::str::contains(REPO))
        .stdout(predicate::str::contains("refs/tags/v1.0.0"));
}

#[test]
fn test_dry_run_refuses_plain_directory_at_checkout_path() {
    let home = TempDir::new().expect("tempdir");
    std::fs::create_dir_all(home.path().join("setup-private")).expect("mkdir");
    std::fs::write(home.path().join("setup-private/notes.txt"), "keep me").expect("write");

    bootstrapper(&home)
        .args(["--dry-run", "--unattended", "-r", REPO])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not a git repository"));

    assert!(home.path().join("setup-private/notes.txt").exists());
}

#[test]
fn test_orphaned_custom_key_is_fatal_and_left_in_place() {
    let home = TempDir::new().expect("tempdir");
    let ssh = home.path().join(".ssh");
    std::fs::create_dir_all(&ssh).expect("mkdir");
    std::fs::write(ssh.join("work.pub"), "ssh-ed25519 AAAA orphan\n").expect("write");

    bootstrapper(&home)
        .args(["--dry-run", "--unattended", "-r", REPO, "-k", "~/.ssh/work.pub"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("without its private key"));

    assert!(ssh.join("work.pub").exists());
    assert!(!ssh.join("work").exists());
}
