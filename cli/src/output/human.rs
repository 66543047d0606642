//! Human-readable terminal renderer.

use anyhow::{Context, Result};
use owo_colors::OwoColorize as _;
use qrcode::QrCode;
use qrcode::render::unicode::Dense1x2;

use crate::domain::config::RunConfiguration;
use crate::domain::keys::KeyPair;
use crate::output::OutputContext;

/// Renders bootstrap state as human-readable terminal output.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Summarise what this run is about to do.
    pub fn render_plan(&self, cfg: &RunConfiguration) {
        let mode = if cfg.dry_run { " (dry run)" } else { "" };
        self.ctx.header(&format!("Bootstrapping this machine{mode}"));
        self.ctx.kv("Repository:", &cfg.repo.url);
        let reference = match &cfg.repo.tag {
            Some(tag) => format!("tag {tag}"),
            None => format!("branch {}", cfg.repo.branch),
        };
        self.ctx.kv("Ref:       ", &reference);
        self.ctx.kv("Checkout:  ", &cfg.repo.target_dir.display().to_string());
        self.ctx.kv("Key:       ", &cfg.key.public_path.display().to_string());
        if !self.ctx.quiet {
            println!();
        }
    }

    /// Print the public key and its QR code for registration.
    ///
    /// This is the run's primary output and is printed even when `quiet`.
    /// `contents` is `None` when the key has not been written yet (dry-run).
    ///
    /// # Errors
    ///
    /// Returns an error if the key is too large to encode as a QR code.
    pub fn render_public_key(&self, key: &KeyPair, contents: Option<&str>) -> Result<()> {
        let Some(contents) = contents.map(str::trim) else {
            println!(
                "  {} public key would be written to {}",
                "[dry-run]".style(self.ctx.styles.dim),
                key.public_path.display()
            );
            return Ok(());
        };

        println!();
        println!(
            "  Add this public key as a deploy key on your Git host ({}):",
            key.public_path.display()
        );
        println!();
        println!("{}", contents.style(self.ctx.styles.bold));
        println!();
        print!("{}", qr_text(contents)?);
        println!();
        Ok(())
    }
}

/// Encode `data` as a terminal QR code with a quiet zone, two modules per
/// character cell.
///
/// # Errors
///
/// Returns an error if `data` exceeds QR capacity.
pub fn qr_text(data: &str) -> Result<String> {
    let code = QrCode::new(data.as_bytes()).context("encoding public key as QR code")?;
    let mut rendered = code.render::<Dense1x2>().quiet_zone(true).build();
    rendered.push('\n');
    Ok(rendered)
}
