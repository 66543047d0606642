//! Application service: provisioning repository synchronisation.
//!
//! Brings `~/setup-private` to the exact state implied by
//! `(url, branch, tag)`: clone when absent, fetch + reset or tag checkout when
//! present. Imports only from `crate::domain` and `crate::application::ports`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::application::ports::{CommandRunner, LocalFs, ProgressReporter};
use crate::domain::config::{RepoCoordinates, RunConfiguration};
use crate::domain::error::RepoError;
use crate::domain::keys::KeyPair;
use crate::domain::repo::{
    GitStep, PROBE_TIMEOUT_SECS, Transport, clone_steps, is_ssh_url, same_remote, update_steps,
};

/// What the sync did (or, under dry-run, would have done).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Cloned,
    Updated,
}

/// Result of [`sync_repository`].
#[derive(Debug)]
pub struct SyncOutcome {
    /// The real checkout directory.
    pub checkout: PathBuf,
    pub action: SyncAction,
    /// Dry-run clone destination; deleted when the outcome is dropped.
    pub scratch: Option<TempDir>,
}

/// Decide how git should authenticate.
///
/// SSH remotes are probed first with the caller's own SSH setup (batch mode,
/// bounded by a timeout); if that works it is preferred, otherwise the
/// dedicated key is pinned. Non-SSH remotes always use the ambient transport.
/// Under dry-run no probe is made and the dedicated key is assumed.
pub async fn select_transport(
    cfg: &RunConfiguration,
    key: &KeyPair,
    runner: &impl CommandRunner,
) -> Transport {
    if !is_ssh_url(&cfg.repo.url) {
        debug!(url = %cfg.repo.url, "non-SSH remote, using ambient transport");
        return Transport::Ambient;
    }
    let dedicated = Transport::DedicatedKey(key.private_path.clone());
    if cfg.dry_run {
        return dedicated;
    }

    let probe = runner
        .run_with_timeout(
            "git",
            &["ls-remote", "--exit-code", &cfg.repo.url, "HEAD"],
            &Transport::probe_env(),
            Duration::from_secs(PROBE_TIMEOUT_SECS),
        )
        .await;
    match probe {
        Ok(out) if out.status.success() => {
            info!(url = %cfg.repo.url, "repository reachable with ambient SSH configuration");
            Transport::Ambient
        }
        Ok(out) => {
            debug!(
                stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                "ambient SSH probe failed, pinning dedicated key"
            );
            dedicated
        }
        Err(e) => {
            debug!(error = %e, "ambient SSH probe did not complete, pinning dedicated key");
            dedicated
        }
    }
}

/// Clone or update the provisioning checkout.
///
/// An existing directory must be a git work tree whose `origin` matches the
/// requested URL; both are checked before anything is fetched, including
/// under dry-run. Under dry-run no clone, fetch, or reset runs: the steps are
/// described instead, and a would-be clone is pointed at a scratch directory
/// created on demand and removed when the outcome is dropped.
///
/// # Errors
///
/// Returns [`RepoError::NotARepository`], [`RepoError::OriginMismatch`], or
/// [`RepoError::GitFailed`]. Nothing is retried.
pub async fn sync_repository(
    cfg: &RunConfiguration,
    transport: &Transport,
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
) -> Result<SyncOutcome> {
    let repo = &cfg.repo;
    let target = &repo.target_dir;

    if fs.exists(target) {
        verify_checkout(repo, runner, fs).await?;
        let steps = update_steps(&repo.branch, repo.tag.as_deref(), target);
        reporter.step(&format!("updating {} to {}...", target.display(), describe_ref(repo)));
        execute(&steps, transport, cfg.dry_run, runner, reporter).await?;
        reporter.success(&format!("{} at {}", target.display(), describe_ref(repo)));
        return Ok(SyncOutcome {
            checkout: target.clone(),
            action: SyncAction::Updated,
            scratch: None,
        });
    }

    let scratch = if cfg.dry_run {
        Some(
            tempfile::Builder::new()
                .prefix("bootstrapper-dry-run-")
                .tempdir()
                .context("creating dry-run scratch directory")?,
        )
    } else {
        None
    };
    let dest = scratch
        .as_ref()
        .map_or_else(|| target.clone(), |s| s.path().join("setup-private"));

    reporter.step(&format!("cloning {} ({})...", repo.url, describe_ref(repo)));
    let steps = clone_steps(&repo.url, &repo.branch, repo.tag.as_deref(), &dest);
    execute(&steps, transport, cfg.dry_run, runner, reporter).await?;
    if !cfg.dry_run {
        reporter.success(&format!("cloned into {}", target.display()));
    }

    Ok(SyncOutcome {
        checkout: target.clone(),
        action: SyncAction::Cloned,
        scratch,
    })
}

/// Check that `repo.target_dir` is a git work tree tracking `repo.url`.
async fn verify_checkout(
    repo: &RepoCoordinates,
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
) -> Result<()> {
    let dir = &repo.target_dir;
    let dir_s = dir.to_string_lossy();

    if !fs.exists(&dir.join(".git")) {
        return Err(RepoError::NotARepository(dir.clone()).into());
    }
    let inside = runner
        .run("git", &["-C", &dir_s, "rev-parse", "--is-inside-work-tree"])
        .await
        .context("running git rev-parse")?;
    if !inside.status.success() {
        return Err(RepoError::NotARepository(dir.clone()).into());
    }

    let origin = runner
        .run("git", &["-C", &dir_s, "config", "--get", "remote.origin.url"])
        .await
        .context("reading remote.origin.url")?;
    let found = String::from_utf8_lossy(&origin.stdout).trim().to_string();
    if !origin.status.success() || !same_remote(&found, &repo.url) {
        return Err(RepoError::OriginMismatch {
            path: dir.clone(),
            expected: repo.url.clone(),
            found: if found.is_empty() { "(no origin)".to_string() } else { found },
        }
        .into());
    }
    debug!(dir = %dir.display(), origin = %found, "existing checkout verified");
    Ok(())
}

async fn execute(
    steps: &[GitStep],
    transport: &Transport,
    dry_run: bool,
    runner: &impl CommandRunner,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    let env = transport.git_env();
    for step in steps {
        if dry_run {
            let via = if step.network { describe_transport(transport) } else { String::new() };
            reporter.step(&format!("[dry-run] would run: {}{via}", step.display()));
            continue;
        }
        debug!(cmd = %step.display(), network = step.network, "git");
        let args: Vec<&str> = step.args.iter().map(String::as_str).collect();
        let step_env: &[(String, String)] = if step.network { &env } else { &[] };
        let status = runner
            .run_status("git", &args, step_env)
            .await
            .with_context(|| format!("running {}", step.display()))?;
        if !status.success() {
            return Err(RepoError::GitFailed {
                step: step.label,
                code: status.code().unwrap_or(-1),
                network: step.network,
            }
            .into());
        }
    }
    Ok(())
}

fn describe_ref(repo: &RepoCoordinates) -> String {
    match &repo.tag {
        Some(tag) => format!("tag {tag}"),
        None => format!("origin/{}", repo.branch),
    }
}

fn describe_transport(transport: &Transport) -> String {
    match transport {
        Transport::Ambient => " (ambient SSH)".to_string(),
        Transport::DedicatedKey(key) => format!(" (key {})", key.display()),
    }
}
