//! Host facts: hostname and wall clock.

use chrono::{DateTime, Local};

use crate::application::ports::HostInfo;

/// Reads the real hostname and clock.
pub struct SystemHost;

impl HostInfo for SystemHost {
    fn hostname(&self) -> Option<String> {
        let name = hostname::get().ok()?;
        let name = name.to_string_lossy().trim().to_string();
        (!name.is_empty()).then_some(name)
    }

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}
