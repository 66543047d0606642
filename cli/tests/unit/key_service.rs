//! Key resolution over every combination of existing key material.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use bootstrapper_cli::application::services::keys::resolve_key_pair;
use bootstrapper_cli::domain::config::RunConfiguration;
use bootstrapper_cli::domain::error::KeyError;
use bootstrapper_cli::domain::keys::{KeyPair, is_timestamped_key_name};
use bootstrapper_cli::infra::fs::StdFs;
use tempfile::TempDir;

use crate::mocks::{
    FAKE_PUBLIC_KEY, FakeRunner, FixedHost, RecordingReporter, config, config_with, inputs,
};

async fn resolve(cfg: &RunConfiguration, runner: &FakeRunner) -> anyhow::Result<KeyPair> {
    resolve_key_pair(cfg, &StdFs, runner, &FixedHost::named("web01"), &RecordingReporter::default())
        .await
}

fn ssh_dir(home: &TempDir) -> std::path::PathBuf {
    let dir = home.path().join(".ssh");
    std::fs::create_dir_all(&dir).expect("mkdir .ssh");
    dir
}

fn write(path: &Path, contents: &str) {
    std::fs::write(path, contents).expect("write fixture");
}

#[tokio::test]
async fn test_missing_pair_generates_ed25519_with_host_comment() {
    let home = TempDir::new().expect("tempdir");
    let cfg = config(home.path());
    let runner = FakeRunner::new();

    let key = resolve(&cfg, &runner).await.expect("generated");

    assert!(!key.preexisting);
    assert_eq!(key.public_path, home.path().join(".ssh/bootstrapper.pub"));
    assert!(key.private_path.exists());
    assert!(key.public_path.exists());
    let keygen = runner.calls_with("ssh-keygen", "ed25519");
    assert_eq!(keygen.len(), 1);
    let args = &keygen[0].args;
    assert!(args.windows(2).any(|w| w == ["-N", ""]), "passphrase-less: {args:?}");
    assert!(args.windows(2).any(|w| w == ["-C", "bootstrap-web01"]), "{args:?}");
}

#[tokio::test]
async fn test_keygen_runs_without_time_limit() {
    let home = TempDir::new().expect("tempdir");
    let runner = FakeRunner::new();
    write(&ssh_dir(&home).join("bootstrapper"), "private\n");

    resolve(&config(home.path()), &runner).await.expect("derived");
    let other = TempDir::new().expect("tempdir");
    resolve(&config(other.path()), &runner).await.expect("generated");

    let keygen = runner.calls_with("ssh-keygen", "-f");
    assert_eq!(keygen.len(), 2);
    assert!(keygen.iter().all(|c| !c.bounded), "{keygen:?}");
}

#[cfg(unix)]
#[tokio::test]
async fn test_generated_key_dir_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let home = TempDir::new().expect("tempdir");
    let cfg = config(home.path());
    resolve(&cfg, &FakeRunner::new()).await.expect("generated");

    let mode = std::fs::metadata(home.path().join(".ssh"))
        .expect("stat")
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o700);
}

#[tokio::test]
async fn test_existing_pair_is_reused_without_keygen() {
    let home = TempDir::new().expect("tempdir");
    let dir = ssh_dir(&home);
    write(&dir.join("bootstrapper"), "PRIVATE");
    write(&dir.join("bootstrapper.pub"), "ssh-ed25519 AAAA existing\n");
    let runner = FakeRunner::new();

    let key = resolve(&config(home.path()), &runner).await.expect("reused");

    assert!(key.preexisting);
    assert!(runner.calls().is_empty(), "no commands: {:?}", runner.lines());
    assert_eq!(
        std::fs::read_to_string(dir.join("bootstrapper.pub")).unwrap(),
        "ssh-ed25519 AAAA existing\n"
    );
}

#[tokio::test]
async fn test_private_only_derives_public_key() {
    let home = TempDir::new().expect("tempdir");
    let dir = ssh_dir(&home);
    write(&dir.join("bootstrapper"), "PRIVATE");
    let runner = FakeRunner::new();

    let key = resolve(&config(home.path()), &runner).await.expect("derived");

    assert!(key.preexisting);
    assert_eq!(runner.calls_with("ssh-keygen", "-y").len(), 1);
    let public = std::fs::read_to_string(dir.join("bootstrapper.pub")).expect("public written");
    assert!(public.starts_with(FAKE_PUBLIC_KEY));
    assert!(public.ends_with('\n'));
}

#[tokio::test]
async fn test_orphan_default_key_unattended_redirects_to_timestamped_pair() {
    let home = TempDir::new().expect("tempdir");
    let dir = ssh_dir(&home);
    write(&dir.join("bootstrapper.pub"), "ssh-ed25519 AAAA orphan\n");
    let cfg = config_with(
        home.path(),
        bootstrapper_cli::domain::config::ConfigInputs {
            unattended: true,
            ..inputs()
        },
    );

    let key = resolve(&cfg, &FakeRunner::new()).await.expect("redirected");

    let name = key.public_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(is_timestamped_key_name(&name), "got {name}");
    assert_eq!(name, "bootstrapper_20260314T150926.pub");
    assert_eq!(key.public_path.parent(), Some(dir.as_path()));
    assert!(!key.preexisting);
    assert!(key.private_path.exists());
    assert_eq!(
        std::fs::read_to_string(dir.join("bootstrapper.pub")).unwrap(),
        "ssh-ed25519 AAAA orphan\n",
        "orphan must be left untouched"
    );
}

#[tokio::test]
async fn test_orphan_interactive_is_fatal_and_leaves_orphan() {
    let home = TempDir::new().expect("tempdir");
    let dir = ssh_dir(&home);
    write(&dir.join("bootstrapper.pub"), "ssh-ed25519 AAAA orphan\n");
    let runner = FakeRunner::new();

    let err = resolve(&config(home.path()), &runner).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<KeyError>(),
        Some(KeyError::OrphanedPublicKey { .. })
    ));
    assert!(err.to_string().contains("rm "), "remediation hint: {err}");
    assert!(runner.calls().is_empty());
    assert!(!dir.join("bootstrapper").exists());
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
}

#[tokio::test]
async fn test_orphan_custom_path_is_fatal_even_unattended() {
    let home = TempDir::new().expect("tempdir");
    let dir = ssh_dir(&home);
    write(&dir.join("work.pub"), "ssh-ed25519 AAAA orphan\n");
    let cfg = config_with(
        home.path(),
        bootstrapper_cli::domain::config::ConfigInputs {
            unattended: true,
            key: Some("~/.ssh/work.pub".to_string()),
            ..inputs()
        },
    );

    let err = resolve(&cfg, &FakeRunner::new()).await.unwrap_err();
    assert!(err.downcast_ref::<KeyError>().is_some());
}

#[tokio::test]
async fn test_dry_run_never_touches_key_files() {
    let home = TempDir::new().expect("tempdir");
    let cfg = config_with(
        home.path(),
        bootstrapper_cli::domain::config::ConfigInputs {
            dry_run: true,
            ..inputs()
        },
    );
    let runner = FakeRunner::new();
    let reporter = RecordingReporter::default();

    let key = resolve_key_pair(&cfg, &StdFs, &runner, &FixedHost::named("web01"), &reporter)
        .await
        .expect("dry run");

    assert!(!key.preexisting);
    assert!(runner.calls().is_empty());
    assert!(!home.path().join(".ssh").exists());
    assert!(reporter.saw_step("[dry-run] would generate"));
}

#[tokio::test]
async fn test_keygen_failure_is_reported() {
    let home = TempDir::new().expect("tempdir");
    let runner = FakeRunner::new();
    runner.keygen_fails.set(true);

    let err = resolve(&config(home.path()), &runner).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<KeyError>(),
        Some(KeyError::KeygenFailed { .. })
    ));
}

#[tokio::test]
async fn test_unknown_hostname_falls_back_in_comment() {
    let home = TempDir::new().expect("tempdir");
    let runner = FakeRunner::new();
    let host = FixedHost {
        name: None,
        ..FixedHost::named("ignored")
    };

    let key = resolve_key_pair(
        &config(home.path()),
        &StdFs,
        &runner,
        &host,
        &RecordingReporter::default(),
    )
    .await
    .expect("generated");
    assert_eq!(key.comment, "bootstrap-unknown");
}
