//! Provisioning checkout: transport choice, origin comparison, and the git
//! command sequences for each sync path.
//!
//! Pure functions only. `application::services::repo_sync` executes them.

use std::path::{Path, PathBuf};

/// Bound on the ambient-access probe, in seconds.
pub const PROBE_TIMEOUT_SECS: u64 = 20;

/// How git authenticates against the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// The caller's own SSH configuration and agent.
    Ambient,
    /// The bootstrapper's dedicated private key, pinned with `IdentitiesOnly`.
    DedicatedKey(PathBuf),
}

impl Transport {
    /// Value for `GIT_SSH_COMMAND`.
    ///
    /// Host keys are trusted on first use (`accept-new`) and verified after.
    #[must_use]
    pub fn ssh_command(&self) -> String {
        match self {
            Self::Ambient => "ssh -o StrictHostKeyChecking=accept-new".to_string(),
            Self::DedicatedKey(key) => format!(
                "ssh -i {} -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new",
                shell_quote(&key.to_string_lossy())
            ),
        }
    }

    /// Environment for every network git command.
    #[must_use]
    pub fn git_env(&self) -> Vec<(String, String)> {
        vec![
            ("GIT_SSH_COMMAND".to_string(), self.ssh_command()),
            ("GIT_TERMINAL_PROMPT".to_string(), "0".to_string()),
        ]
    }

    /// Environment for the ambient probe: same as ambient, but never prompts.
    #[must_use]
    pub fn probe_env() -> Vec<(String, String)> {
        vec![
            (
                "GIT_SSH_COMMAND".to_string(),
                "ssh -o BatchMode=yes -o ConnectTimeout=10 -o StrictHostKeyChecking=accept-new"
                    .to_string(),
            ),
            ("GIT_TERMINAL_PROMPT".to_string(), "0".to_string()),
        ]
    }
}

/// Returns `true` for URLs git will fetch over SSH (`ssh://` or scp-style).
#[must_use]
pub fn is_ssh_url(url: &str) -> bool {
    if url.starts_with("ssh://") || url.starts_with("git+ssh://") {
        return true;
    }
    if url.contains("://") {
        return false;
    }
    // scp-like syntax: [user@]host:path, where the colon precedes any slash.
    match (url.find(':'), url.find('/')) {
        (Some(colon), Some(slash)) => colon < slash,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Normalise a remote URL for comparison: trims whitespace, a trailing `/`,
/// and a trailing `.git`.
#[must_use]
pub fn normalize_remote(url: &str) -> &str {
    let url = url.trim().trim_end_matches('/');
    url.strip_suffix(".git").unwrap_or(url)
}

/// Returns `true` if two remote URLs name the same repository.
#[must_use]
pub fn same_remote(a: &str, b: &str) -> bool {
    normalize_remote(a) == normalize_remote(b)
}

/// A single git invocation: arguments after `git`, and whether it talks to
/// the network (and so needs the transport environment).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitStep {
    pub label: &'static str,
    pub args: Vec<String>,
    pub network: bool,
}

impl GitStep {
    fn local(label: &'static str, args: Vec<String>) -> Self {
        Self {
            label,
            args,
            network: false,
        }
    }

    fn remote(label: &'static str, args: Vec<String>) -> Self {
        Self {
            label,
            args,
            network: true,
        }
    }

    /// The command line as the operator would type it.
    #[must_use]
    pub fn display(&self) -> String {
        format!("git {}", self.args.join(" "))
    }
}

fn dir_arg(dir: &Path) -> String {
    dir.to_string_lossy().into_owned()
}

/// Steps that create a fresh shallow checkout at `dest`.
#[must_use]
pub fn clone_steps(url: &str, branch: &str, tag: Option<&str>, dest: &Path) -> Vec<GitStep> {
    let dest_s = dir_arg(dest);
    match tag {
        Some(tag) => vec![
            GitStep::remote(
                "clone",
                vec!["clone".into(), "--depth".into(), "1".into(), url.into(), dest_s.clone()],
            ),
            GitStep::remote(
                "fetch tag",
                vec![
                    "-C".into(),
                    dest_s.clone(),
                    "fetch".into(),
                    "--depth".into(),
                    "1".into(),
                    "origin".into(),
                    "tag".into(),
                    tag.into(),
                ],
            ),
            checkout_tag(&dest_s, tag),
        ],
        None => vec![GitStep::remote(
            "clone",
            vec![
                "clone".into(),
                "--branch".into(),
                branch.into(),
                "--depth".into(),
                "1".into(),
                url.into(),
                dest_s,
            ],
        )],
    }
}

/// Steps that bring an existing checkout at `dir` to the requested ref.
///
/// With a tag only tags are fetched: the branch may not exist on the remote,
/// and a tagged clone never tracked it.
#[must_use]
pub fn update_steps(branch: &str, tag: Option<&str>, dir: &Path) -> Vec<GitStep> {
    let dir_s = dir_arg(dir);
    let mut fetch_args: Vec<String> = vec![
        "-C".into(),
        dir_s.clone(),
        "fetch".into(),
        "--tags".into(),
        "--force".into(),
        "--prune".into(),
        "origin".into(),
    ];
    if let Some(tag) = tag {
        let fetch = GitStep::remote("fetch", fetch_args);
        return vec![fetch, checkout_tag(&dir_s, tag)];
    }

    let remote_ref = format!("refs/remotes/origin/{branch}");
    fetch_args.push(format!("+refs/heads/{branch}:{remote_ref}"));
    vec![
        GitStep::remote("fetch", fetch_args),
        GitStep::local(
            "checkout",
            vec![
                "-C".into(),
                dir_s.clone(),
                "checkout".into(),
                "--force".into(),
                "-B".into(),
                branch.into(),
                remote_ref.clone(),
            ],
        ),
        GitStep::local(
            "reset",
            vec!["-C".into(), dir_s, "reset".into(), "--hard".into(), remote_ref],
        ),
    ]
}

fn checkout_tag(dir: &str, tag: &str) -> GitStep {
    GitStep::local(
        "checkout tag",
        vec![
            "-C".into(),
            dir.into(),
            "-c".into(),
            "advice.detachedHead=false".into(),
            "checkout".into(),
            "--force".into(),
            "--detach".into(),
            format!("refs/tags/{tag}"),
        ],
    )
}

/// Quote `s` for a POSIX shell (git runs `GIT_SSH_COMMAND` through `sh`).
#[must_use]
pub fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+=:@,".contains(c))
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}
