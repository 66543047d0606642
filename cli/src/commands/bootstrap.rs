//! `bootstrapper`: key, checkout, provisioning script, in that order.

use std::process::ExitCode;

use anyhow::Result;
use tracing::info;

use crate::app::AppContext;
use crate::application::ports::{
    CommandRunner, HostInfo, LocalFs, PrivilegeEscalator, ProgressReporter, Prompter, ToolLocator,
};
use crate::application::services::dependencies::{InstallPolicy, ensure_tools};
use crate::application::services::keys::resolve_key_pair;
use crate::application::services::provision::run_script;
use crate::application::services::repo_sync::{select_transport, sync_repository};
use crate::domain::config::RunConfiguration;
use crate::domain::keys::KeyPair;
use crate::domain::packages::{TOOL_BASH, TOOL_GIT, TOOL_SSH, TOOL_SSH_KEYGEN, TOOL_SUDO};
use crate::domain::repo::Transport;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::fs::StdFs;
use crate::infra::host::SystemHost;
use crate::infra::privilege::SudoEscalator;
use crate::infra::tools::WhichLocator;
use crate::output::{HumanRenderer, OutputContext, progress};

/// Run the bootstrap with production infrastructure.
///
/// # Errors
///
/// Returns the first fatal error from any stage.
pub async fn run(app: &AppContext, cfg: &RunConfiguration) -> Result<ExitCode> {
    let runner = TokioCommandRunner::default();
    let escalator = SudoEscalator::new(&runner);
    let reporter = app.terminal_reporter();

    let code = execute(
        cfg,
        &app.output,
        &runner,
        &escalator,
        &StdFs,
        &SystemHost,
        &WhichLocator,
        app,
        &reporter,
    )
    .await?;
    Ok(ExitCode::from(code))
}

/// The bootstrap sequence over injected ports. Returns the script's exit
/// code, or `0` under dry-run.
///
/// # Errors
///
/// Returns the first fatal error from any stage; later stages do not run.
#[allow(clippy::too_many_arguments)]
pub async fn execute(
    cfg: &RunConfiguration,
    out: &OutputContext,
    runner: &impl CommandRunner,
    escalator: &impl PrivilegeEscalator,
    fs: &impl LocalFs,
    host: &impl HostInfo,
    locator: &impl ToolLocator,
    prompter: &impl Prompter,
    reporter: &impl ProgressReporter,
) -> Result<u8> {
    let renderer = HumanRenderer::new(out);
    renderer.render_plan(cfg);

    let (required, optional) = tool_sets(cfg.script.sudo, escalator.is_elevated());
    ensure_tools(
        &required,
        &optional,
        InstallPolicy::from(cfg),
        locator,
        runner,
        escalator,
        prompter,
        reporter,
    )
    .await?;

    let key = resolve_key_pair(cfg, fs, runner, host, reporter).await?;

    let transport = if out.show_progress() && !cfg.dry_run {
        let pb = progress::spinner("checking repository access...");
        let transport = select_transport(cfg, &key, runner).await;
        progress::finish_ok(&pb, &describe_access(&transport));
        transport
    } else {
        let transport = select_transport(cfg, &key, runner).await;
        reporter.step(&describe_access(&transport));
        transport
    };
    info!(?transport, preexisting = key.preexisting, "transport selected");

    if !(key.preexisting && cfg.unattended) {
        display_key(&renderer, &key, fs)?;
    }

    if needs_confirmation(cfg, &key, &transport) {
        let registered = prompter.confirm(
            "Has the public key been added to your Git host? Continue",
            true,
        )?;
        if !registered {
            anyhow::bail!(
                "aborted before cloning; register {} and re-run",
                key.public_path.display()
            );
        }
    }

    let outcome = sync_repository(cfg, &transport, runner, fs, reporter).await?;
    let code = run_script(cfg, &outcome.checkout, fs, runner, escalator, reporter).await?;
    drop(outcome);
    Ok(code)
}

/// Required and optional tools for this run.
///
/// `sudo` is required only to run the script with privilege from a
/// non-root process; otherwise it is merely useful for package installs.
fn tool_sets(script_sudo: bool, elevated: bool) -> (Vec<&'static str>, Vec<&'static str>) {
    let mut required = vec![TOOL_GIT, TOOL_SSH, TOOL_SSH_KEYGEN, TOOL_BASH];
    let mut optional = Vec::new();
    if !elevated {
        if script_sudo {
            required.push(TOOL_SUDO);
        } else {
            optional.push(TOOL_SUDO);
        }
    }
    (required, optional)
}

/// A freshly created key in an interactive, real run has to be registered
/// before the clone can authenticate with it.
fn needs_confirmation(cfg: &RunConfiguration, key: &KeyPair, transport: &Transport) -> bool {
    !cfg.unattended
        && !cfg.dry_run
        && !key.preexisting
        && matches!(transport, Transport::DedicatedKey(_))
}

fn display_key(renderer: &HumanRenderer<'_>, key: &KeyPair, fs: &impl LocalFs) -> Result<()> {
    let contents = if fs.exists(&key.public_path) {
        Some(fs.read_to_string(&key.public_path)?)
    } else {
        None
    };
    renderer.render_public_key(key, contents.as_deref())
}

fn describe_access(transport: &Transport) -> String {
    match transport {
        Transport::Ambient => "using your existing SSH/Git access".to_string(),
        Transport::DedicatedKey(key) => format!("using dedicated key {}", key.display()),
    }
}
