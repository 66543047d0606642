//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local};

use crate::domain::config::FileConfig;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
///
/// `env` entries are added to the inherited environment of the child.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output, bounded by the runner's
    /// default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Run a program and capture its output with no time limit.
    async fn run_captured(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Run a program with extra environment and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        env: &[(String, String)],
        timeout: Duration,
    ) -> Result<Output>;

    /// Run a program with inherited stdio and return its exit status.
    /// No timeout: used for clone, fetch, and package installs.
    async fn run_status(
        &self,
        program: &str,
        args: &[&str],
        env: &[(String, String)],
    ) -> Result<ExitStatus>;

    /// Like `run_status`, but with `dir` as the working directory.
    async fn run_status_in(&self, dir: &Path, program: &str, args: &[&str])
    -> Result<ExitStatus>;
}

// ── Privilege Port ────────────────────────────────────────────────────────────

/// Runs commands with elevated privilege (`sudo` unless already root).
#[allow(async_fn_in_trait)]
pub trait PrivilegeEscalator {
    /// Returns `true` when the process already runs with root privileges.
    fn is_elevated(&self) -> bool;

    /// Run `program args` with privilege, in `dir` when given, with
    /// inherited stdio. Returns the command's exit status.
    async fn run_privileged(
        &self,
        dir: Option<&Path>,
        program: &str,
        args: &[&str],
    ) -> Result<ExitStatus>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Interaction Port ──────────────────────────────────────────────────────────

/// Yes/no questions to the operator.
pub trait Prompter {
    /// Ask a yes/no question. Non-interactive implementations return `default`.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

// ── Host Ports ────────────────────────────────────────────────────────────────

/// Facts about the machine being bootstrapped.
pub trait HostInfo {
    /// The hostname, if it can be determined.
    fn hostname(&self) -> Option<String>;
    /// Current local time.
    fn now(&self) -> DateTime<Local>;
}

/// Finds executables on `PATH`.
pub trait ToolLocator {
    /// Full path of `tool`, or `None` if it is not installed.
    fn locate(&self, tool: &str) -> Option<PathBuf>;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Abstracts raw filesystem operations.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn write(&self, path: &Path, content: &str) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Set Unix permission bits. A no-op on other platforms.
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()>;
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Loads the optional defaults file.
pub trait ConfigStore {
    /// Load the file, or defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<FileConfig>;

    /// Where the file lives.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}
