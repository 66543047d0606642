//! Package managers the bootstrapper knows how to drive, and the table that
//! maps logical tool names to each manager's package names.

use std::fmt;

/// Logical tools the bootstrap flow needs.
pub const TOOL_GIT: &str = "git";
pub const TOOL_SSH: &str = "ssh";
pub const TOOL_SSH_KEYGEN: &str = "ssh-keygen";
pub const TOOL_SUDO: &str = "sudo";
pub const TOOL_BASH: &str = "bash";

/// A supported system package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
    Yum,
    Pacman,
    Zypper,
    Apk,
    Brew,
}

impl PackageManager {
    /// Detection order: the first manager whose binary is found wins.
    pub const ALL: [Self; 7] = [
        Self::Apt,
        Self::Dnf,
        Self::Yum,
        Self::Pacman,
        Self::Zypper,
        Self::Apk,
        Self::Brew,
    ];

    /// Executable used to detect and drive this manager.
    #[must_use]
    pub fn binary(self) -> &'static str {
        match self {
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Yum => "yum",
            Self::Pacman => "pacman",
            Self::Zypper => "zypper",
            Self::Apk => "apk",
            Self::Brew => "brew",
        }
    }

    /// Whether installs must run with elevated privilege.
    #[must_use]
    pub fn needs_privilege(self) -> bool {
        !matches!(self, Self::Brew)
    }

    /// Package providing `tool`, or `None` if this manager cannot supply it.
    #[must_use]
    pub fn package_for(self, tool: &str) -> Option<&'static str> {
        match (tool, self) {
            (TOOL_GIT, _) => Some("git"),
            (TOOL_BASH, _) => Some("bash"),
            (TOOL_SSH | TOOL_SSH_KEYGEN, Self::Apt | Self::Apk) => Some("openssh-client"),
            (TOOL_SSH | TOOL_SSH_KEYGEN, Self::Dnf | Self::Yum | Self::Zypper) => {
                Some("openssh-clients")
            }
            (TOOL_SSH | TOOL_SSH_KEYGEN, Self::Pacman | Self::Brew) => Some("openssh"),
            (TOOL_SUDO, Self::Brew) => None,
            (TOOL_SUDO, _) => Some("sudo"),
            _ => None,
        }
    }

    /// Commands (program + args) that install `packages`, run in order.
    ///
    /// Apt needs its index refreshed first on fresh machines.
    #[must_use]
    pub fn install_commands(self, packages: &[&str]) -> Vec<Vec<String>> {
        let bin = self.binary().to_string();
        let mut install: Vec<String> = match self {
            Self::Apt | Self::Dnf | Self::Yum => vec![bin.clone(), "install".into(), "-y".into()],
            Self::Pacman => vec![bin.clone(), "-S".into(), "--noconfirm".into(), "--needed".into()],
            Self::Zypper => vec![bin.clone(), "--non-interactive".into(), "install".into()],
            Self::Apk => vec![bin.clone(), "add".into()],
            Self::Brew => vec![bin.clone(), "install".into()],
        };
        install.extend(packages.iter().map(|p| (*p).to_string()));

        match self {
            Self::Apt => vec![vec![bin, "update".into()], install],
            _ => vec![install],
        }
    }

    /// One-line manual instruction shown when installation was declined.
    #[must_use]
    pub fn manual_hint(self, packages: &[&str]) -> String {
        let cmd = self
            .install_commands(packages)
            .into_iter()
            .map(|c| c.join(" "))
            .collect::<Vec<_>>()
            .join(" && ");
        if self.needs_privilege() {
            format!("Install manually with: sudo {}", cmd.replace(" && ", " && sudo "))
        } else {
            format!("Install manually with: {cmd}")
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

/// Deduplicated package list for `tools`, plus tools this manager cannot supply.
#[must_use]
pub fn packages_for<'a>(
    manager: PackageManager,
    tools: &[&'a str],
) -> (Vec<&'static str>, Vec<&'a str>) {
    let mut packages = Vec::new();
    let mut unavailable = Vec::new();
    for tool in tools {
        match manager.package_for(tool) {
            Some(pkg) if !packages.contains(&pkg) => packages.push(pkg),
            Some(_) => {}
            None => unavailable.push(*tool),
        }
    }
    (packages, unavailable)
}
