//! Application service: make sure the external tools the bootstrap needs
//! are installed, installing them through the system package manager when
//! the install mode allows it.

use anyhow::Result;
use tracing::{debug, info};

use crate::application::ports::{
    CommandRunner, PrivilegeEscalator, ProgressReporter, Prompter, ToolLocator,
};
use crate::domain::config::{InstallMode, RunConfiguration};
use crate::domain::error::EnvironmentError;
use crate::domain::packages::{PackageManager, TOOL_SUDO, packages_for};

/// How missing tools may be installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallPolicy {
    pub mode: InstallMode,
    pub unattended: bool,
    pub dry_run: bool,
}

impl From<&RunConfiguration> for InstallPolicy {
    fn from(cfg: &RunConfiguration) -> Self {
        Self {
            mode: cfg.install_mode,
            unattended: cfg.unattended,
            dry_run: cfg.dry_run,
        }
    }
}

/// The first supported package manager found on this machine.
#[must_use]
pub fn detect_package_manager(locator: &impl ToolLocator) -> Option<PackageManager> {
    PackageManager::ALL
        .into_iter()
        .find(|pm| locator.locate(pm.binary()).is_some())
}

/// Ensure `required` and `optional` tools are on `PATH`.
///
/// Missing tools are installed according to `policy.mode`; `Prompt` asks
/// first and behaves like `Deny` in unattended runs. Afterwards, a missing
/// optional tool is a warning and a missing required tool is fatal. Under
/// dry-run installs are only described (without asking) and nothing is fatal.
///
/// # Errors
///
/// Returns an [`EnvironmentError`] if a required tool is still missing, no
/// package manager is available, or the package manager fails.
#[allow(clippy::too_many_arguments)]
pub async fn ensure_tools(
    required: &[&str],
    optional: &[&str],
    policy: InstallPolicy,
    locator: &impl ToolLocator,
    runner: &impl CommandRunner,
    escalator: &impl PrivilegeEscalator,
    prompter: &impl Prompter,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    let missing_required = missing(required, locator);
    let missing_optional = missing(optional, locator);
    if missing_required.is_empty() && missing_optional.is_empty() {
        debug!(?required, ?optional, "all tools present");
        return Ok(());
    }
    info!(?missing_required, ?missing_optional, "tools missing");

    let Some(manager) = detect_package_manager(locator) else {
        for tool in &missing_optional {
            reporter.warn(&format!("optional tool '{tool}' not found"));
        }
        if missing_required.is_empty() {
            return Ok(());
        }
        let err = EnvironmentError::NoPackageManager {
            missing: owned(&missing_required),
        };
        if policy.dry_run {
            reporter.warn(&err.to_string());
            return Ok(());
        }
        return Err(err.into());
    };

    let wanted: Vec<&str> = missing_required
        .iter()
        .chain(&missing_optional)
        .copied()
        .collect();
    let (packages, unavailable) = packages_for(manager, &wanted);
    for tool in &unavailable {
        reporter.warn(&format!("{manager} cannot provide '{tool}'"));
    }

    let install = !packages.is_empty()
        && can_install(manager, locator, escalator, reporter)
        && wants_install(policy, manager, &packages, prompter)?;

    if policy.dry_run {
        if install {
            for cmd in manager.install_commands(&packages) {
                let sudo = if manager.needs_privilege() && !escalator.is_elevated() {
                    "sudo "
                } else {
                    ""
                };
                reporter.step(&format!("[dry-run] would run: {sudo}{}", cmd.join(" ")));
            }
        } else {
            reporter.warn(&format!("missing tools: {}", wanted.join(", ")));
        }
        return Ok(());
    }

    if install {
        reporter.step(&format!("installing {} with {manager}...", packages.join(", ")));
        install_packages(manager, &packages, runner, escalator).await?;
        reporter.success(&format!("installed {}", packages.join(", ")));
    }

    for tool in missing(&missing_optional, locator) {
        reporter.warn(&format!("optional tool '{tool}' is still missing; continuing"));
    }
    let still_missing = missing(&missing_required, locator);
    if !still_missing.is_empty() {
        return Err(EnvironmentError::MissingTools {
            missing: owned(&still_missing),
            guidance: (!install && !packages.is_empty()).then(|| manager.manual_hint(&packages)),
        }
        .into());
    }
    Ok(())
}

fn missing<'a>(tools: &[&'a str], locator: &impl ToolLocator) -> Vec<&'a str> {
    tools
        .iter()
        .copied()
        .filter(|t| locator.locate(t).is_none())
        .collect()
}

fn owned(tools: &[&str]) -> Vec<String> {
    tools.iter().map(|t| (*t).to_string()).collect()
}

/// Installs through a system manager need root or a working `sudo`.
fn can_install(
    manager: PackageManager,
    locator: &impl ToolLocator,
    escalator: &impl PrivilegeEscalator,
    reporter: &impl ProgressReporter,
) -> bool {
    if !manager.needs_privilege()
        || escalator.is_elevated()
        || locator.locate(TOOL_SUDO).is_some()
    {
        return true;
    }
    reporter.warn(&format!("cannot run {manager} without root or sudo"));
    false
}

fn wants_install(
    policy: InstallPolicy,
    manager: PackageManager,
    packages: &[&str],
    prompter: &impl Prompter,
) -> Result<bool> {
    match policy.mode {
        InstallMode::Auto => Ok(true),
        InstallMode::Deny => Ok(false),
        InstallMode::Prompt if policy.unattended => Ok(false),
        InstallMode::Prompt if policy.dry_run => Ok(true),
        InstallMode::Prompt => prompter.confirm(
            &format!("Install {} with {manager}?", packages.join(", ")),
            true,
        ),
    }
}

async fn install_packages(
    manager: PackageManager,
    packages: &[&str],
    runner: &impl CommandRunner,
    escalator: &impl PrivilegeEscalator,
) -> Result<()> {
    for cmd in manager.install_commands(packages) {
        let Some((program, rest)) = cmd.split_first() else {
            continue;
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();
        debug!(cmd = %cmd.join(" "), "installing packages");
        let status = if manager.needs_privilege() {
            escalator.run_privileged(None, program, &args).await?
        } else {
            runner.run_status(program, &args, &[]).await?
        };
        if !status.success() {
            return Err(EnvironmentError::InstallFailed {
                manager: manager.to_string(),
                code: status.code().unwrap_or(-1),
            }
            .into());
        }
    }
    Ok(())
}
