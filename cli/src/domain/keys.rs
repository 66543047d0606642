//! SSH key lifecycle: the key pair descriptor and the state table that
//! decides what to do with whatever key material is already on disk.
//!
//! Pure functions only. The service in `application::services::keys` performs
//! the filesystem and `ssh-keygen` work these functions describe.

use std::path::{Path, PathBuf};

use crate::domain::config::private_key_path;

/// File stem used for timestamped replacement keys.
pub const KEY_STEM: &str = "bootstrapper";
/// `chrono` format for the replacement key timestamp (`YYYYMMDDTHHMMSS`).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";
/// Host label used when the hostname cannot be determined.
pub const UNKNOWN_HOST: &str = "unknown";

/// One SSH identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub public_path: PathBuf,
    pub private_path: PathBuf,
    /// `true` when usable key material was found rather than generated.
    pub preexisting: bool,
    pub comment: String,
}

impl KeyPair {
    /// Build a descriptor for `public_path`, deriving the private path.
    #[must_use]
    pub fn at(public_path: &Path, host_label: &str) -> Self {
        Self {
            public_path: public_path.to_path_buf(),
            private_path: private_key_path(public_path),
            preexisting: false,
            comment: key_comment(host_label),
        }
    }

    /// Return a new descriptor pointing at a timestamped pair next to this one.
    ///
    /// The orphaned files are left untouched.
    #[must_use]
    pub fn redirected(&self, timestamp: &str) -> Self {
        let dir = self.public_path.parent().unwrap_or_else(|| Path::new(""));
        let private_path = dir.join(format!("{KEY_STEM}_{timestamp}"));
        Self {
            public_path: private_path.with_extension("pub"),
            private_path,
            preexisting: false,
            comment: self.comment.clone(),
        }
    }

    /// Copy of this descriptor with `preexisting` set.
    #[must_use]
    pub fn with_preexisting(mut self, preexisting: bool) -> Self {
        self.preexisting = preexisting;
        self
    }
}

/// What to do given which halves of the pair exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Both halves present.
    Reuse,
    /// Only the private key present: regenerate the public half from it.
    DerivePublic,
    /// Only the public key present.
    Orphaned,
    /// Nothing present: generate a fresh ed25519 pair.
    Generate,
}

impl KeyAction {
    /// Classify the on-disk state.
    #[must_use]
    pub fn classify(private_exists: bool, public_exists: bool) -> Self {
        match (private_exists, public_exists) {
            (true, true) => Self::Reuse,
            (true, false) => Self::DerivePublic,
            (false, true) => Self::Orphaned,
            (false, false) => Self::Generate,
        }
    }
}

/// How an orphaned public key is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanPolicy {
    /// Generate a timestamped replacement pair.
    Redirect,
    /// Stop and ask the operator to intervene.
    Refuse,
}

impl OrphanPolicy {
    /// Redirect only for the default key path in an unattended run.
    #[must_use]
    pub fn decide(is_default_path: bool, unattended: bool) -> Self {
        if is_default_path && unattended {
            Self::Redirect
        } else {
            Self::Refuse
        }
    }
}

/// Key comment embedding the host label.
#[must_use]
pub fn key_comment(host_label: &str) -> String {
    let label = host_label.trim();
    let label = if label.is_empty() { UNKNOWN_HOST } else { label };
    format!("bootstrap-{label}")
}

/// Returns `true` if `name` looks like `bootstrapper_YYYYMMDDTHHMMSS[.pub]`.
#[must_use]
pub fn is_timestamped_key_name(name: &str) -> bool {
    let name = name.strip_suffix(".pub").unwrap_or(name);
    let Some(stamp) = name
        .strip_prefix(KEY_STEM)
        .and_then(|s| s.strip_prefix('_'))
    else {
        return false;
    };
    let bytes = stamp.as_bytes();
    bytes.len() == 15
        && bytes[8] == b'T'
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[9..].iter().all(u8::is_ascii_digit)
}
