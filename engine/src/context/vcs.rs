//! Git queries used to resolve repository context.
//!
//! Every query is best-effort: a missing binary, a non-zero exit or a
//! directory outside any repository all come back as `None`.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

/// Repository information for a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitInfo {
    /// Repository top-level directory
    pub root: PathBuf,
    /// Current branch name (if available)
    pub branch: Option<String>,
}

/// Detect the repository containing `dir` using the given git program
pub fn detect_git(program: &str, dir: &Path) -> Option<GitInfo> {
    let root = git_output(program, dir, &["rev-parse", "--show-toplevel"])?;
    let branch = git_output(program, dir, &["rev-parse", "--abbrev-ref", "HEAD"]);

    Some(GitInfo {
        root: PathBuf::from(root),
        branch,
    })
}

/// Run a git query scoped to `dir` and return its trimmed stdout.
///
/// Optional locks are disabled so a query never contends with a git
/// process the user is running in the same repository.
fn git_output(program: &str, dir: &Path, args: &[&str]) -> Option<String> {
    let output = match Command::new(program)
        .args(args)
        .current_dir(dir)
        .env("GIT_OPTIONAL_LOCKS", "0")
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            debug!("Failed to run {} {:?}: {}", program, args, e);
            return None;
        }
    };

    if !output.status.success() {
        debug!("{} {:?} exited with {}", program, args, output.status);
        return None;
    }

    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
