//! Application service: SSH key resolution use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::application::ports::{CommandRunner, HostInfo, LocalFs, ProgressReporter};
use crate::domain::config::RunConfiguration;
use crate::domain::error::KeyError;
use crate::domain::keys::{KeyAction, KeyPair, OrphanPolicy, TIMESTAMP_FORMAT, UNKNOWN_HOST};

const KEY_DIR_MODE: u32 = 0o700;
const PUBLIC_KEY_MODE: u32 = 0o644;

/// Guarantee a usable key pair exists at the configured location.
///
/// Handles every combination of existing key material:
///
/// | private | public | outcome |
/// |---|---|---|
/// | yes | yes | reused |
/// | yes | no  | public half derived from the private key |
/// | no  | yes | orphan: redirected to a timestamped pair, or refused |
/// | no  | no  | fresh ed25519 pair generated |
///
/// Under dry-run nothing is written, but the returned descriptor reports
/// `preexisting` as if the action had happened.
///
/// # Errors
///
/// Returns [`KeyError::OrphanedPublicKey`] when an orphan cannot be safely
/// recovered, and [`KeyError::KeygenFailed`] when `ssh-keygen` fails.
pub async fn resolve_key_pair(
    cfg: &RunConfiguration,
    fs: &impl LocalFs,
    runner: &impl CommandRunner,
    host: &impl HostInfo,
    reporter: &impl ProgressReporter,
) -> Result<KeyPair> {
    let host_label = host
        .hostname()
        .unwrap_or_else(|| UNKNOWN_HOST.to_string());
    let pair = KeyPair::at(&cfg.key.public_path, &host_label);

    let action = KeyAction::classify(fs.exists(&pair.private_path), fs.exists(&pair.public_path));
    debug!(?action, public = %pair.public_path.display(), "key state");

    match action {
        KeyAction::Reuse => {
            reporter.success(&format!("using existing key {}", pair.public_path.display()));
            Ok(pair.with_preexisting(true))
        }
        KeyAction::DerivePublic => {
            derive_public_key(&pair, cfg.dry_run, fs, runner, reporter).await?;
            Ok(pair.with_preexisting(true))
        }
        KeyAction::Orphaned => match OrphanPolicy::decide(cfg.key.is_default_path(), cfg.unattended)
        {
            OrphanPolicy::Redirect => {
                let stamp = host.now().format(TIMESTAMP_FORMAT).to_string();
                let fresh = pair.redirected(&stamp);
                reporter.warn(&format!(
                    "{} has no private key; leaving it in place and using {}",
                    pair.public_path.display(),
                    fresh.public_path.display()
                ));
                info!(orphan = %pair.public_path.display(), replacement = %fresh.public_path.display(), "redirecting orphaned key");
                generate_key_pair(&fresh, cfg.dry_run, fs, runner, reporter).await?;
                Ok(fresh)
            }
            OrphanPolicy::Refuse => Err(KeyError::OrphanedPublicKey {
                public: pair.public_path,
                private: pair.private_path,
            }
            .into()),
        },
        KeyAction::Generate => {
            generate_key_pair(&pair, cfg.dry_run, fs, runner, reporter).await?;
            Ok(pair)
        }
    }
}

/// Rebuild the public half from the private key with `ssh-keygen -y`.
async fn derive_public_key(
    pair: &KeyPair,
    dry_run: bool,
    fs: &impl LocalFs,
    runner: &impl CommandRunner,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    if dry_run {
        reporter.step(&format!(
            "[dry-run] would derive {} from {}",
            pair.public_path.display(),
            pair.private_path.display()
        ));
        return Ok(());
    }

    reporter.step(&format!(
        "deriving public key from {}...",
        pair.private_path.display()
    ));
    ensure_key_dir(fs, &pair.public_path, true)?;

    let private = pair.private_path.to_string_lossy();
    let output = runner
        .run_captured("ssh-keygen", &["-y", "-f", &private])
        .await
        .context("running ssh-keygen -y")?;
    if !output.status.success() {
        return Err(KeyError::KeygenFailed {
            action: "derive public key",
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    let mut public = String::from_utf8(output.stdout).context("ssh-keygen output is not valid UTF-8")?;
    if !public.ends_with('\n') {
        public.push('\n');
    }
    fs.write(&pair.public_path, &public)?;
    fs.set_permissions(&pair.public_path, PUBLIC_KEY_MODE)?;
    reporter.success(&format!("derived {}", pair.public_path.display()));
    Ok(())
}

/// Generate a passphrase-less ed25519 pair at `pair.private_path`.
async fn generate_key_pair(
    pair: &KeyPair,
    dry_run: bool,
    fs: &impl LocalFs,
    runner: &impl CommandRunner,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    if dry_run {
        reporter.step(&format!(
            "[dry-run] would generate ed25519 key {} (comment {})",
            pair.private_path.display(),
            pair.comment
        ));
        return Ok(());
    }

    reporter.step(&format!(
        "generating ed25519 key {}...",
        pair.private_path.display()
    ));
    ensure_key_dir(fs, &pair.public_path, false)?;

    let private = pair.private_path.to_string_lossy();
    let output = runner
        .run_captured(
            "ssh-keygen",
            &["-q", "-t", "ed25519", "-N", "", "-C", &pair.comment, "-f", &private],
        )
        .await
        .context("running ssh-keygen")?;
    if !output.status.success() {
        return Err(KeyError::KeygenFailed {
            action: "generate key pair",
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    fs.set_permissions(&pair.public_path, PUBLIC_KEY_MODE)?;
    reporter.success(&format!("generated {}", pair.public_path.display()));
    Ok(())
}

/// Create the key directory with mode 700 when missing.
///
/// With `tighten`, an existing directory is also reset to 700.
fn ensure_key_dir(fs: &impl LocalFs, key_path: &Path, tighten: bool) -> Result<()> {
    let Some(dir) = key_path.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(());
    };
    if !fs.exists(dir) {
        fs.create_dir_all(dir)?;
        fs.set_permissions(dir, KEY_DIR_MODE)?;
    } else if tighten {
        fs.set_permissions(dir, KEY_DIR_MODE)?;
    }
    Ok(())
}
