//! Shell history import.
//!
//! Turns zsh, bash and fish history files into canonical records and
//! writes them into the sheek log.

pub mod bash;
pub mod fish;
pub mod zsh;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::info;

use crate::error::{Error, Result};
use crate::record::{now_timestamp, HistoryRecord};
use crate::store::HistoryStore;

/// Supported shells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Zsh,
    Bash,
    Fish,
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Shell::Zsh => "zsh",
            Shell::Bash => "bash",
            Shell::Fish => "fish",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Shell {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "zsh" => Ok(Shell::Zsh),
            "bash" => Ok(Shell::Bash),
            "fish" => Ok(Shell::Fish),
            other => Err(Error::UnsupportedShell(other.to_string())),
        }
    }
}

impl Shell {
    /// History file location relative to the home directory
    pub fn default_history_path(&self, home: &Path) -> PathBuf {
        match self {
            Shell::Zsh => home.join(".zsh_history"),
            Shell::Bash => home.join(".bash_history"),
            Shell::Fish => home.join(".local/share/fish/fish_history"),
        }
    }

    /// Parse raw history lines in this shell's format
    pub fn parse<S: AsRef<str>>(&self, lines: &[S], now: i64) -> Vec<HistoryRecord> {
        match self {
            Shell::Zsh => zsh::parse(lines),
            Shell::Bash => bash::parse(lines, now),
            Shell::Fish => fish::parse(lines, now),
        }
    }
}

/// Import settings
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub shell: Shell,
    /// Explicit history file; the shell default when `None`
    pub source: Option<PathBuf>,
    /// Keep only the most recent `limit` records (0 = all)
    pub limit: usize,
    /// Append to the log instead of replacing it
    pub append: bool,
}

impl ImportOptions {
    pub fn new(shell: Shell) -> Self {
        Self {
            shell,
            source: None,
            limit: 0,
            append: true,
        }
    }
}

/// Import shell history into the store; returns the number of records written
pub fn import_history(options: &ImportOptions, store: &HistoryStore) -> Result<usize> {
    let path = resolve_source_path(options.shell, options.source.as_deref())?;
    let records = read_history(options.shell, &path, options.limit)?;

    let written = if options.append {
        store.append(&records)?
    } else {
        store.replace(&records)?
    };

    info!(
        "Imported {} {} commands from {}",
        written,
        options.shell,
        path.display()
    );
    Ok(written)
}

/// Read and parse one shell history file.
///
/// Fails with `SourceUnreadable` when the file cannot be read and with
/// `NothingToImport` when it holds no usable commands.
pub fn read_history(shell: Shell, path: &Path, limit: usize) -> Result<Vec<HistoryRecord>> {
    let lines = read_lines(path)?;
    let records = trim_to_limit(shell.parse(&lines, now_timestamp()), limit);

    if records.is_empty() {
        return Err(Error::NothingToImport {
            path: path.to_path_buf(),
        });
    }
    Ok(records)
}

/// Explicit path (with `~` expanded) or the shell's default location
pub fn resolve_source_path(shell: Shell, custom: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = custom {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).to_string();
        return Ok(PathBuf::from(expanded));
    }

    let dirs = directories::BaseDirs::new().ok_or(Error::NoHomeDir)?;
    Ok(shell.default_history_path(dirs.home_dir()))
}

/// Keep the chronological tail of `records` when `limit` is set and smaller
pub fn trim_to_limit(mut records: Vec<HistoryRecord>, limit: usize) -> Vec<HistoryRecord> {
    if limit > 0 && limit < records.len() {
        let cut = records.len() - limit;
        records.drain(..cut);
    }
    records
}

/// Read a history file as lines. Invalid UTF-8 is replaced rather than rejected,
/// since zsh writes metafied bytes.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).map_err(|source| Error::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect())
}
