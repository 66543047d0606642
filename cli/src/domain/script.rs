//! Provisioning entry point resolution.

use std::path::{Path, PathBuf};

/// Exit code reported when the script was terminated by a signal.
pub const SIGNALLED_EXIT_CODE: u8 = 255;

/// Resolve the script path against the checkout root unless it is absolute.
#[must_use]
pub fn resolve_script_path(checkout: &Path, script: &Path) -> PathBuf {
    if script.is_absolute() {
        script.to_path_buf()
    } else {
        checkout.join(script)
    }
}

/// Map a child's exit code to the process exit code, unmodified when it fits.
#[must_use]
pub fn exit_code_from(code: Option<i32>) -> u8 {
    code.and_then(|c| u8::try_from(c).ok())
        .unwrap_or(SIGNALLED_EXIT_CODE)
}
