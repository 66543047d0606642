//! Run configuration: the immutable snapshot every core operation reads.
//!
//! Pure functions only: no I/O, no async, no filesystem access. Reading the
//! optional YAML file happens in `infra::config`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_SCRIPT: &str = "bootstrap.sh";
/// Default public key location, relative to the home directory.
pub const DEFAULT_PUBLIC_KEY: &str = ".ssh/bootstrapper.pub";
/// Fixed checkout location, relative to the home directory.
pub const CHECKOUT_DIR: &str = "setup-private";

// ── Install mode ─────────────────────────────────────────────────────────────

/// What to do when a required tool is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    /// Ask before installing.
    #[default]
    Prompt,
    /// Install without asking.
    Auto,
    /// Never install; report what is missing.
    Deny,
}

// ── Config file schema ───────────────────────────────────────────────────────

/// Optional defaults stored in `~/.bootstrapper/config.yaml`.
///
/// Every field is optional; command-line flags win over the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub tag: Option<String>,
    pub script: Option<String>,
    pub key: Option<String>,
    pub install: Option<InstallMode>,
}

// ── Resolved configuration ───────────────────────────────────────────────────

/// Coordinates of the provisioning repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub url: String,
    pub branch: String,
    /// When set, supersedes `branch` for checkout.
    pub tag: Option<String>,
    pub target_dir: PathBuf,
}

/// Where the dedicated key lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConfig {
    pub public_path: PathBuf,
    /// The built-in default location, used by the orphan recovery policy.
    pub default_public_path: PathBuf,
}

impl KeyConfig {
    /// Returns `true` when the configured public key is the default one.
    #[must_use]
    pub fn is_default_path(&self) -> bool {
        self.public_path == self.default_public_path
    }
}

/// The provisioning entry point and how to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptConfig {
    /// Relative to the checkout root unless absolute.
    pub path: PathBuf,
    pub args: Vec<String>,
    pub sudo: bool,
}

/// Immutable snapshot of one invocation's options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    pub repo: RepoCoordinates,
    pub key: KeyConfig,
    pub script: ScriptConfig,
    pub install_mode: InstallMode,
    pub dry_run: bool,
    pub unattended: bool,
    pub verbose: bool,
}

/// Raw options as parsed from the command line, before defaults apply.
#[derive(Debug, Clone, Default)]
pub struct ConfigInputs {
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub tag: Option<String>,
    pub script: Option<String>,
    pub key: Option<String>,
    pub install_mode: Option<InstallMode>,
    pub dry_run: bool,
    pub unattended: bool,
    pub verbose: bool,
    pub sudo: bool,
    pub script_args: Vec<String>,
}

impl RunConfiguration {
    /// Merge command-line inputs over the config file over built-in defaults.
    ///
    /// `config_label` names the config file in the missing-repo error.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if no repository URL is available, the key
    /// path is empty or lacks a `.pub` suffix, or the branch is empty.
    pub fn resolve(
        inputs: ConfigInputs,
        file: FileConfig,
        home: &Path,
        config_label: &str,
    ) -> Result<Self> {
        let url = inputs
            .repo
            .or(file.repo)
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRepo {
                config: config_label.to_string(),
            })?;

        let branch = inputs
            .branch
            .or(file.branch)
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());
        if branch.trim().is_empty() {
            return Err(ConfigError::EmptyBranch.into());
        }

        let tag = inputs.tag.or(file.tag).filter(|t| !t.trim().is_empty());

        let default_public_path = home.join(DEFAULT_PUBLIC_KEY);
        let public_path = match inputs.key.or(file.key) {
            Some(raw) if raw.trim().is_empty() => return Err(ConfigError::EmptyKeyPath.into()),
            Some(raw) => expand_tilde(&raw, home),
            None => default_public_path.clone(),
        };
        if public_path.extension().is_none_or(|ext| ext != "pub") {
            return Err(ConfigError::KeyPathNotPub(public_path).into());
        }

        let script = inputs
            .script
            .or(file.script)
            .unwrap_or_else(|| DEFAULT_SCRIPT.to_string());

        Ok(Self {
            repo: RepoCoordinates {
                url: url.trim().to_string(),
                branch,
                tag,
                target_dir: home.join(CHECKOUT_DIR),
            },
            key: KeyConfig {
                public_path,
                default_public_path,
            },
            script: ScriptConfig {
                path: expand_tilde(&script, home),
                args: inputs.script_args,
                sudo: inputs.sudo,
            },
            install_mode: inputs
                .install_mode
                .or(file.install)
                .unwrap_or_default(),
            dry_run: inputs.dry_run,
            unattended: inputs.unattended,
            verbose: inputs.verbose,
        })
    }
}

// ── Path helpers ─────────────────────────────────────────────────────────────

/// Strip a trailing `.pub` from a public key path.
#[must_use]
pub fn private_key_path(public: &Path) -> PathBuf {
    if public.extension().is_some_and(|ext| ext == "pub") {
        public.with_extension("")
    } else {
        public.to_path_buf()
    }
}

/// Expand a leading `~` against `home`. Other paths are returned unchanged.
#[must_use]
pub fn expand_tilde(raw: &str, home: &Path) -> PathBuf {
    if raw == "~" {
        home.to_path_buf()
    } else if let Some(rest) = raw.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(raw)
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
