//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use crate::app::{AppContext, OutputFlags};
use crate::application::ports::ConfigStore;
use crate::commands;
use crate::domain::config::{ConfigInputs, InstallMode, RunConfiguration};
use crate::domain::error::ConfigError;
use crate::infra::config::YamlConfigStore;

/// Bootstrap this machine from a private provisioning repository
///
/// Creates a dedicated SSH key, shows it for registration as a deploy key,
/// syncs ~/setup-private over SSH, and runs its bootstrap script.
#[derive(Parser, Debug)]
#[command(name = "bootstrapper", version)]
pub struct Cli {
    /// Provisioning repository URL (e.g. git@github.com:me/setup-private.git)
    #[arg(short, long, env = "BOOTSTRAPPER_REPO", value_name = "URL")]
    pub repo: Option<String>,

    /// Branch to check out [default: main]
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Tag to check out instead of the branch head
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Script to run, relative to the checkout unless absolute [default: bootstrap.sh]
    #[arg(short, long, value_name = "PATH")]
    pub script: Option<String>,

    /// Public key path; must end in .pub [default: ~/.ssh/bootstrapper.pub]
    #[arg(short, long, env = "BOOTSTRAPPER_KEY", value_name = "PATH")]
    pub key: Option<String>,

    /// Install missing tools without asking
    #[arg(long, conflicts_with = "no_install")]
    pub auto_install: bool,

    /// Never install missing tools
    #[arg(long)]
    pub no_install: bool,

    /// Show what would happen without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Never prompt; recover orphaned default keys automatically
    #[arg(short = 'y', long, env = "BOOTSTRAPPER_UNATTENDED")]
    pub unattended: bool,

    /// Run the script with root privileges (via sudo unless already root)
    #[arg(long)]
    pub sudo: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output (the public key is still shown)
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Arguments forwarded verbatim to the script
    #[arg(last = true, value_name = "ARGS")]
    pub script_args: Vec<String>,
}

impl Cli {
    /// Resolve the configuration and run the bootstrap.
    ///
    /// # Errors
    ///
    /// Configuration problems are returned as a `clap::Error` so the caller
    /// can exit with usage text; anything else is a runtime failure.
    pub async fn run(self) -> Result<ExitCode> {
        let store = YamlConfigStore;
        let file = store.load()?;
        let label = store
            .path()
            .map_or_else(|_| "~/.bootstrapper/config.yaml".to_string(), |p| p.display().to_string());
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;

        let flags = OutputFlags {
            no_color: self.no_color,
            quiet: self.quiet,
        };
        let cfg = RunConfiguration::resolve(self.into_inputs(), file, &home, &label)
            .map_err(usage_error)?;
        tracing::debug!(?cfg, "resolved configuration");

        let app = AppContext::new(&flags, cfg.unattended);
        commands::bootstrap::run(&app, &cfg)
            .await
            .context("bootstrap failed")
    }

    fn into_inputs(self) -> ConfigInputs {
        let install_mode = if self.auto_install {
            Some(InstallMode::Auto)
        } else if self.no_install {
            Some(InstallMode::Deny)
        } else {
            None
        };
        ConfigInputs {
            repo: self.repo,
            branch: self.branch,
            tag: self.tag,
            script: self.script,
            key: self.key,
            install_mode,
            dry_run: self.dry_run,
            unattended: self.unattended,
            verbose: self.verbose,
            sudo: self.sudo,
            script_args: self.script_args,
        }
    }
}

/// Re-raise a `ConfigError` as a clap usage error.
fn usage_error(err: anyhow::Error) -> anyhow::Error {
    let kind = match err.downcast_ref::<ConfigError>() {
        Some(ConfigError::MissingRepo { .. }) => ErrorKind::MissingRequiredArgument,
        Some(_) => ErrorKind::ValueValidation,
        None => return err,
    };
    Cli::command().error(kind, err.to_string()).into()
}
