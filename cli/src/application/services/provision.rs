//! Application service: hand control to the provisioning script.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::application::ports::{CommandRunner, LocalFs, PrivilegeEscalator, ProgressReporter};
use crate::domain::config::RunConfiguration;
use crate::domain::error::ScriptError;
use crate::domain::script::{exit_code_from, resolve_script_path};

/// Run the provisioning script from the checkout root with `bash`,
/// forwarding the configured arguments verbatim and returning its exit code.
///
/// Under dry-run the invocation is only described and `0` is returned;
/// the script's presence is not checked since the checkout may not exist.
///
/// # Errors
///
/// Returns [`ScriptError::NotFound`] when the script is missing, or an error
/// if `bash` (or `sudo`) cannot be spawned.
pub async fn run_script(
    cfg: &RunConfiguration,
    checkout: &Path,
    fs: &impl LocalFs,
    runner: &impl CommandRunner,
    escalator: &impl PrivilegeEscalator,
    reporter: &impl ProgressReporter,
) -> Result<u8> {
    let script = resolve_script_path(checkout, &cfg.script.path);
    let script_s = script.to_string_lossy();
    let mut args: Vec<&str> = vec![&*script_s];
    args.extend(cfg.script.args.iter().map(String::as_str));

    let elevate = cfg.script.sudo && !escalator.is_elevated();
    if cfg.dry_run {
        let prefix = if elevate { "sudo " } else { "" };
        reporter.step(&format!(
            "[dry-run] would run in {}: {prefix}bash {}",
            checkout.display(),
            args.join(" ")
        ));
        return Ok(0);
    }

    if !fs.is_file(&script) {
        return Err(ScriptError::NotFound(script).into());
    }

    reporter.step(&format!("running {}...", script.display()));
    info!(script = %script.display(), args = ?cfg.script.args, sudo = cfg.script.sudo, "starting provisioning script");
    let started = if cfg.script.sudo {
        escalator.run_privileged(Some(checkout), "bash", &args).await
    } else {
        runner.run_status_in(checkout, "bash", &args).await
    };
    let status = started.with_context(|| format!("starting {}", script.display()))?;

    let code = exit_code_from(status.code());
    info!(code, "provisioning script finished");
    if code == 0 {
        reporter.success("provisioning script completed");
    } else {
        reporter.warn(&format!("provisioning script exited with status {code}"));
    }
    Ok(code)
}
