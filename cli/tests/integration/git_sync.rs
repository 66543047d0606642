//! Repository sync against a real `git` and a local `file://` remote whose
//! default branch is `master`. Skipped when `git` is not installed.

#![cfg(unix)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::process::Command;

use bootstrapper_cli::application::ports::ProgressReporter;
use bootstrapper_cli::application::services::repo_sync::{SyncAction, sync_repository};
use bootstrapper_cli::domain::config::{ConfigInputs, FileConfig, RunConfiguration};
use bootstrapper_cli::domain::repo::Transport;
use bootstrapper_cli::infra::command_runner::TokioCommandRunner;
use bootstrapper_cli::infra::fs::StdFs;
use tempfile::TempDir;

struct Silent;

impl ProgressReporter for Silent {
    fn step(&self, _message: &str) {}
    fn success(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}

fn git_available() -> bool {
    which::which("git").is_ok()
}

fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args([
            "-c",
            "user.name=Test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
            "-c",
            "tag.gpgsign=false",
        ])
        .args(args)
        .output()
        .expect("spawn git");
    assert!(
        out.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

/// Upstream with history `one` <- `two` (tagged `v1`) <- `three` on `master`.
struct Upstream {
    _dir: TempDir,
    path: PathBuf,
}

impl Upstream {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("upstream");
        std::fs::create_dir_all(&path).expect("upstream dir");
        git(&path, &["init", "-q"]);
        git(&path, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        let upstream = Self { _dir: dir, path };
        upstream.commit("one");
        upstream.commit("two");
        git(&upstream.path, &["tag", "v1"]);
        upstream.commit("three");
        upstream
    }

    fn commit(&self, message: &str) {
        std::fs::write(self.path.join("bootstrap.sh"), format!("echo {message}\n"))
            .expect("write file");
        git(&self.path, &["add", "bootstrap.sh"]);
        git(&self.path, &["commit", "-q", "-m", message]);
    }

    fn url(&self) -> String {
        format!("file://{}", self.path.display())
    }

    fn rev(&self, rev: &str) -> String {
        git(&self.path, &["rev-parse", &format!("{rev}^{{commit}}")])
    }
}

fn cfg(home: &Path, upstream: &Upstream, branch: &str, tag: Option<&str>) -> RunConfiguration {
    let inputs = ConfigInputs {
        repo: Some(upstream.url()),
        branch: Some(branch.to_string()),
        tag: tag.map(str::to_string),
        ..ConfigInputs::default()
    };
    RunConfiguration::resolve(inputs, FileConfig::default(), home, "config.yaml")
        .expect("valid config")
}

async fn sync(cfg: &RunConfiguration) -> SyncAction {
    sync_repository(
        cfg,
        &Transport::Ambient,
        &TokioCommandRunner::default(),
        &StdFs,
        &Silent,
    )
    .await
    .expect("sync")
    .action
}

fn head(checkout: &Path) -> String {
    git(checkout, &["rev-parse", "HEAD"])
}

fn is_detached(checkout: &Path) -> bool {
    !Command::new("git")
        .arg("-C")
        .arg(checkout)
        .args(["symbolic-ref", "-q", "HEAD"])
        .status()
        .expect("spawn git")
        .success()
}

#[tokio::test]
async fn test_branch_clone_then_update_is_a_fixed_point_and_follows_upstream() {
    if !git_available() {
        return;
    }
    let upstream = Upstream::new();
    let home = TempDir::new().expect("tempdir");
    let checkout = home.path().join("setup-private");
    let branch = cfg(home.path(), &upstream, "master", None);

    assert_eq!(sync(&branch).await, SyncAction::Cloned);
    let first = head(&checkout);
    assert_eq!(first, upstream.rev("master"));

    assert_eq!(sync(&branch).await, SyncAction::Updated);
    assert_eq!(head(&checkout), first);

    upstream.commit("four");
    std::fs::write(checkout.join("bootstrap.sh"), "local edit\n").expect("dirty tree");
    sync(&branch).await;
    assert_eq!(head(&checkout), upstream.rev("master"));
    assert_eq!(
        std::fs::read_to_string(checkout.join("bootstrap.sh")).unwrap(),
        "echo four\n"
    );
    assert!(!is_detached(&checkout));
}

#[tokio::test]
async fn test_tag_after_branch_detaches_at_tag_commit() {
    if !git_available() {
        return;
    }
    let upstream = Upstream::new();
    let home = TempDir::new().expect("tempdir");
    let checkout = home.path().join("setup-private");

    sync(&cfg(home.path(), &upstream, "master", None)).await;
    sync(&cfg(home.path(), &upstream, "master", Some("v1"))).await;

    assert_eq!(head(&checkout), upstream.rev("v1"));
    assert!(is_detached(&checkout));
}

#[tokio::test]
async fn test_repeated_tag_sync_is_stable_when_branch_is_absent_upstream() {
    if !git_available() {
        return;
    }
    let upstream = Upstream::new();
    let home = TempDir::new().expect("tempdir");
    let checkout = home.path().join("setup-private");
    // the default branch name does not exist upstream; the tag must win
    let tagged = cfg(home.path(), &upstream, "main", Some("v1"));

    assert_eq!(sync(&tagged).await, SyncAction::Cloned);
    assert_eq!(head(&checkout), upstream.rev("v1"));

    assert_eq!(sync(&tagged).await, SyncAction::Updated);
    assert_eq!(head(&checkout), upstream.rev("v1"));
    assert!(is_detached(&checkout));
}

#[tokio::test]
async fn test_branch_after_tag_returns_to_branch_head() {
    if !git_available() {
        return;
    }
    let upstream = Upstream::new();
    let home = TempDir::new().expect("tempdir");
    let checkout = home.path().join("setup-private");

    sync(&cfg(home.path(), &upstream, "master", Some("v1"))).await;
    assert_eq!(head(&checkout), upstream.rev("v1"));

    sync(&cfg(home.path(), &upstream, "master", None)).await;
    assert_eq!(head(&checkout), upstream.rev("master"));
    assert_eq!(git(&checkout, &["symbolic-ref", "--short", "HEAD"]), "master");
}
