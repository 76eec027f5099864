//! Context-aware ranking of history entries.
//!
//! Each command's stored context is compared with the current one:
//! - Directory match (exact, child or parent directory)
//! - Repository name match
//! - Branch match
//! - Workspace root match
//!
//! The boost is additive and computed once over the whole set before any
//! query-driven search runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::record::{Command, CommandContext};

/// Bonus values for each context signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostWeights {
    /// Command ran in the current directory (default: 400)
    #[serde(default = "default_directory_exact")]
    pub directory_exact: i64,
    /// Command ran below the current directory (default: 250)
    #[serde(default = "default_directory_child")]
    pub directory_child: i64,
    /// Command ran above the current directory (default: 150)
    #[serde(default = "default_directory_parent")]
    pub directory_parent: i64,
    /// Same repository name (default: 200)
    #[serde(default = "default_repository")]
    pub repository: i64,
    /// Same branch (default: 150)
    #[serde(default = "default_branch")]
    pub branch: i64,
    /// Same workspace root (default: 100)
    #[serde(default = "default_workspace")]
    pub workspace: i64,
}

impl Default for BoostWeights {
    fn default() -> Self {
        Self {
            directory_exact: 400,
            directory_child: 250,
            directory_parent: 150,
            repository: 200,
            branch: 150,
            workspace: 100,
        }
    }
}

fn default_directory_exact() -> i64 { 400 }
fn default_directory_child() -> i64 { 250 }
fn default_directory_parent() -> i64 { 150 }
fn default_repository() -> i64 { 200 }
fn default_branch() -> i64 { 150 }
fn default_workspace() -> i64 { 100 }

/// Context-aware ranker
#[derive(Debug, Clone, Default)]
pub struct ContextRanker {
    weights: BoostWeights,
}

impl ContextRanker {
    pub fn new(weights: BoostWeights) -> Self {
        Self { weights }
    }

    /// Score every command against `current` and sort the set.
    ///
    /// Order is descending boost, then descending index, so the result is
    /// a deterministic total order for any input.
    pub fn apply(&self, mut commands: Vec<Command>, current: &CommandContext) -> Vec<Command> {
        for cmd in commands.iter_mut() {
            cmd.context_boost = self.context_boost(&cmd.context, current);
        }

        commands.sort_by(|a, b| {
            b.context_boost
                .cmp(&a.context_boost)
                .then_with(|| b.index.cmp(&a.index))
        });
        commands
    }

    /// Additive boost of a command context relative to the current one
    pub fn context_boost(&self, cmd: &CommandContext, current: &CommandContext) -> i64 {
        self.directory_boost(&cmd.directory, &current.directory)
            + equal_boost(&cmd.repository, &current.repository, self.weights.repository)
            + equal_boost(&cmd.branch, &current.branch, self.weights.branch)
            + equal_boost(&cmd.workspace, &current.workspace, self.weights.workspace)
    }

    fn directory_boost(&self, cmd_dir: &str, current_dir: &str) -> i64 {
        if cmd_dir.is_empty() || current_dir.is_empty() {
            return 0;
        }
        if cmd_dir == current_dir {
            return self.weights.directory_exact;
        }
        if is_strict_subdir(cmd_dir, current_dir) {
            return self.weights.directory_child;
        }
        if is_strict_subdir(current_dir, cmd_dir) {
            return self.weights.directory_parent;
        }
        0
    }
}

fn equal_boost(cmd_value: &str, current_value: &str, bonus: i64) -> i64 {
    if !cmd_value.is_empty() && cmd_value == current_value {
        bonus
    } else {
        0
    }
}

/// True when `dir` lies strictly below `ancestor`, compared by path components
fn is_strict_subdir(dir: &str, ancestor: &str) -> bool {
    let dir = Path::new(dir);
    let ancestor = Path::new(ancestor);
    dir != ancestor && dir.starts_with(ancestor)
}
