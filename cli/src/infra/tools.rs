//! `PATH` lookup for the `ToolLocator` port.

use std::path::PathBuf;

use crate::application::ports::ToolLocator;

/// Resolves executables with the `which` crate.
pub struct WhichLocator;

impl ToolLocator for WhichLocator {
    fn locate(&self, tool: &str) -> Option<PathBuf> {
        which::which(tool).ok()
    }
}
