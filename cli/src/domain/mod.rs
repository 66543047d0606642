//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod keys;
pub mod packages;
pub mod repo;
pub mod script;

pub use config::{
    ConfigInputs, FileConfig, InstallMode, KeyConfig, RepoCoordinates, RunConfiguration,
    ScriptConfig,
};
pub use error::{ConfigError, EnvironmentError, KeyError, RepoError, ScriptError};
pub use keys::{KeyAction, KeyPair, OrphanPolicy};
pub use packages::PackageManager;
pub use repo::{GitStep, Transport};
