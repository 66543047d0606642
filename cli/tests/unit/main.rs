//! Unit tests for bootstrapper
//!
//! These tests use hand-written port doubles and run without network access
//! or real `git`/`ssh-keygen` binaries.

mod key_service;
