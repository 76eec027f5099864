//! Context resolution for directories.
//!
//! Derives the directory, workspace, repository and branch a command runs
//! in, for context-aware ranking. Resolution is best-effort and never fails.

mod vcs;

pub use vcs::{detect_git, GitInfo};

use std::path::{Component, Path, PathBuf};

use crate::record::CommandContext;

/// Default git program name
const GIT_PROGRAM: &str = "git";

/// Resolves `CommandContext` values by querying git
#[derive(Debug, Clone)]
pub struct ContextResolver {
    program: String,
}

impl Default for ContextResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextResolver {
    pub fn new() -> Self {
        Self::with_program(GIT_PROGRAM)
    }

    /// Use a specific git executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolve context for the process working directory
    pub fn resolve_current(&self) -> CommandContext {
        match std::env::current_dir() {
            Ok(cwd) => self.resolve(&cwd),
            Err(_) => CommandContext::default(),
        }
    }

    /// Resolve context for an arbitrary directory
    pub fn resolve(&self, dir: &Path) -> CommandContext {
        if dir.as_os_str().is_empty() {
            return CommandContext::default();
        }

        let abs_dir = absolute_clean(dir);
        let mut ctx = CommandContext {
            directory: abs_dir.to_string_lossy().to_string(),
            ..Default::default()
        };

        if let Some(info) = detect_git(&self.program, &abs_dir) {
            let workspace = clean_path(&info.root);
            ctx.repository = workspace
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            ctx.workspace = workspace.to_string_lossy().to_string();
            ctx.branch = info.branch.unwrap_or_default();
        }

        ctx
    }
}

/// Make `path` absolute against the process cwd and clean it lexically
pub fn absolute_clean(path: &Path) -> PathBuf {
    let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    clean_path(&abs)
}

/// Lexically normalize a path: drop `.` segments and fold `..` into the parent
pub fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                // ".." at the root stays at the root
                _ if cleaned.has_root() => {}
                _ => cleaned.push(".."),
            },
            other => cleaned.push(other.as_os_str()),
        }
    }

    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}
