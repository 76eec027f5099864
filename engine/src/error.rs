//! Error types for the sheek engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the history engine.
///
/// Malformed log lines and failed git queries never show up here: the
/// former are skipped while loading, the latter collapse into empty
/// context fields.
#[derive(Debug, Error)]
pub enum Error {
    /// The persisted history log does not exist yet (first run).
    #[error("sheek history not found at {}", path.display())]
    HistoryNotFound { path: PathBuf },

    /// A raw shell history file could not be opened or read.
    #[error("failed to read shell history {}: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The shell history was readable but held no usable commands.
    #[error("no commands were imported from {}", path.display())]
    NothingToImport { path: PathBuf },

    #[error("unsupported shell {0:?} (expected zsh, bash or fish)")]
    UnsupportedShell(String),

    #[error("unknown search mode {0:?} (expected exact or fuzzy)")]
    UnknownMode(String),

    /// A blank command was handed to a write path.
    #[error("command text is empty")]
    EmptyCommand,

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode history record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("could not determine home directory")]
    NoHomeDir,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the "no history yet" condition callers treat as a normal first run.
    pub fn is_history_not_found(&self) -> bool {
        matches!(self, Error::HistoryNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
