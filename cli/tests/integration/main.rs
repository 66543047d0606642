//! Integration tests for bootstrapper
//!
//! These tests spawn the actual binary against a throwaway `HOME`, or drive
//! the sync service against a local repository with the real `git`. None
//! need network access.

mod cli_tests;
mod dry_run;
mod git_sync;
