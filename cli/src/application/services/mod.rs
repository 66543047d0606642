//! Application services: use-case orchestration.
//!
//! Each service module implements one step of the bootstrap by composing
//! domain logic with port trait calls. Services import only from
//! `crate::domain` and `crate::application::ports`.

pub mod dependencies;
pub mod keys;
pub mod provision;
pub mod repo_sync;
