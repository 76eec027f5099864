//! Query-driven search over a loaded command set.
//!
//! Two interchangeable modes, both case-insensitive and both pure functions
//! of (commands, query):
//! - exact: contiguous substring filter, keeps input order
//! - fuzzy: ordered-subsequence filter, reordered by match score

pub mod exact;
pub mod fuzzy;

pub use fuzzy::FuzzyMatch;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::record::Command;

/// Search algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Exact,
    Fuzzy,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchMode::Exact => "exact",
            SearchMode::Fuzzy => "fuzzy",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for SearchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(SearchMode::Exact),
            "fuzzy" => Ok(SearchMode::Fuzzy),
            other => Err(Error::UnknownMode(other.to_string())),
        }
    }
}

/// Ordered results of one query, plus per-command match positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub mode: SearchMode,
    pub commands: Vec<Command>,
    /// Fuzzy match byte positions keyed by `Command::index`
    pub positions: HashMap<usize, Vec<usize>>,
}

impl SearchResults {
    /// Matched positions for a command, empty when there are none
    pub fn positions_for(&self, index: usize) -> &[usize] {
        self.positions.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Run `query` against `commands` in the given mode
pub fn search(commands: &[Command], query: &str, mode: SearchMode) -> SearchResults {
    match mode {
        SearchMode::Exact => SearchResults {
            mode,
            commands: exact::search(commands, query),
            positions: HashMap::new(),
        },
        SearchMode::Fuzzy => {
            let matches = fuzzy::search(commands, query);
            let mut positions = HashMap::with_capacity(matches.len());
            let mut ordered = Vec::with_capacity(matches.len());
            for m in matches {
                if !m.positions.is_empty() {
                    positions.insert(m.command.index, m.positions);
                }
                ordered.push(m.command);
            }
            SearchResults {
                mode,
                commands: ordered,
                positions,
            }
        }
    }
}
