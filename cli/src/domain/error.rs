//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors in the resolved run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No repository URL given. Pass --repo <URL>, set BOOTSTRAPPER_REPO, or add `repo:` to {config}")]
    MissingRepo { config: String },

    #[error("Public key path must not be empty")]
    EmptyKeyPath,

    #[error("Public key path must end in .pub (got {0})")]
    KeyPathNotPub(PathBuf),

    #[error("Branch name must not be empty")]
    EmptyBranch,
}

// ── Environment errors ────────────────────────────────────────────────────────

/// Errors raised while making sure the required tools are installed.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("No supported package manager found; cannot install: {}", .missing.join(", "))]
    NoPackageManager { missing: Vec<String> },

    #[error("Required tools are missing: {}{}", .missing.join(", "), .guidance.as_deref().map(|g| format!("\n\n{g}")).unwrap_or_default())]
    MissingTools {
        missing: Vec<String>,
        guidance: Option<String>,
    },

    #[error("Package installation failed ({manager} exited with {code})")]
    InstallFailed { manager: String, code: i32 },
}

// ── Key errors ────────────────────────────────────────────────────────────────

/// Errors in the SSH key lifecycle.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error(
        "Found public key {} without its private key {}.\n\n\
         Refusing to overwrite it. Either remove the public key manually:\n  rm {}\n\
         or re-run with --unattended to generate a fresh timestamped key pair.",
        .public.display(),
        .private.display(),
        .public.display()
    )]
    OrphanedPublicKey { public: PathBuf, private: PathBuf },

    #[error("ssh-keygen failed ({action}): {stderr}")]
    KeygenFailed { action: &'static str, stderr: String },
}

// ── Repository errors ─────────────────────────────────────────────────────────

/// Errors raised while synchronising the provisioning checkout.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{} exists but is not a git repository. Move it aside and re-run.", .0.display())]
    NotARepository(PathBuf),

    #[error(
        "{} tracks a different origin.\n  expected: {expected}\n  found:    {found}\n\
         Move the directory aside or pass the matching --repo.",
        .path.display()
    )]
    OriginMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// `network` marks steps that talked to the remote.
    #[error("git {step} failed (exit {code}).{}", access_hint(.network))]
    GitFailed {
        step: &'static str,
        code: i32,
        network: bool,
    },
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn access_hint(network: &bool) -> &'static str {
    if *network {
        " Check SSH access to the repository and re-run."
    } else {
        ""
    }
}

// ── Script errors ─────────────────────────────────────────────────────────────

/// Errors raised before the provisioning script starts.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Provisioning script not found: {}", .0.display())]
    NotFound(PathBuf),
}
