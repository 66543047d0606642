//! Infrastructure implementation of the `ConfigStore` port.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::application::ports::ConfigStore;
use crate::domain::config::FileConfig;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "BOOTSTRAPPER_CONFIG";

/// Reads `~/.bootstrapper/config.yaml`, or the file named by
/// `BOOTSTRAPPER_CONFIG`.
pub struct YamlConfigStore;

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<FileConfig> {
        let path = self.path()?;
        if !path.exists() {
            return Ok(FileConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(FileConfig::default());
        }
        serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }

    fn path(&self) -> Result<PathBuf> {
        if let Ok(val) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(val));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(home.join(".bootstrapper").join("config.yaml"))
    }
}
