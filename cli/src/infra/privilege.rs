//! Privilege escalation through `sudo`.

use std::path::Path;
use std::process::ExitStatus;

use anyhow::Result;
use tracing::debug;

use crate::application::ports::{CommandRunner, PrivilegeEscalator};

/// Runs privileged commands directly when already root, otherwise through
/// `sudo` with inherited stdio so it can ask for a password.
pub struct SudoEscalator<'a, R> {
    runner: &'a R,
}

impl<'a, R: CommandRunner> SudoEscalator<'a, R> {
    #[must_use]
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> PrivilegeEscalator for SudoEscalator<'_, R> {
    fn is_elevated(&self) -> bool {
        effective_root()
    }

    async fn run_privileged(
        &self,
        dir: Option<&Path>,
        program: &str,
        args: &[&str],
    ) -> Result<ExitStatus> {
        let (program, args): (&str, Vec<&str>) = if self.is_elevated() {
            (program, args.to_vec())
        } else {
            let mut sudo_args = Vec::with_capacity(args.len() + 2);
            sudo_args.push("--");
            sudo_args.push(program);
            sudo_args.extend_from_slice(args);
            ("sudo", sudo_args)
        };
        debug!(program, ?args, "running privileged");
        match dir {
            Some(dir) => self.runner.run_status_in(dir, program, &args).await,
            None => self.runner.run_status(program, &args, &[]).await,
        }
    }
}

#[cfg(unix)]
fn effective_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn effective_root() -> bool {
    false
}
