//! Ordered-subsequence fuzzy matching with positional scoring.

use crate::record::Command;

/// A command matched by a fuzzy query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch {
    pub command: Command,
    /// Relevance, only meaningful for ordering
    pub score: i64,
    /// Byte offsets into `command.text` of each matched query character
    pub positions: Vec<usize>,
}

const BASE_SCORE: i64 = 1000;
const ADJACENT_BONUS: i64 = 50;
const START_BONUS: i64 = 100;
const CASE_BONUS: i64 = 5;
const SPREAD_PENALTY: i64 = 2;

/// Fuzzy-filter `commands` and order them by score.
///
/// Ties keep the lower index first. An empty or whitespace-only query
/// returns every command in input order with no positions.
pub fn search(commands: &[Command], query: &str) -> Vec<FuzzyMatch> {
    if query.trim().is_empty() {
        return commands
            .iter()
            .map(|cmd| FuzzyMatch {
                command: cmd.clone(),
                score: 0,
                positions: Vec::new(),
            })
            .collect();
    }

    let mut matches: Vec<FuzzyMatch> = commands
        .iter()
        .filter_map(|cmd| {
            let positions = match_positions(&cmd.text, query)?;
            let score = score(&cmd.text, query, &positions);
            Some(FuzzyMatch {
                command: cmd.clone(),
                score,
                positions,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.command.index.cmp(&b.command.index))
    });
    matches
}

/// Locate each query character in order, ignoring case.
///
/// Greedy single pass: every query character takes the first remaining
/// occurrence in the text. Returns `None` when some character cannot be
/// found or the query is empty.
pub fn match_positions(text: &str, query: &str) -> Option<Vec<usize>> {
    if query.is_empty() {
        return None;
    }

    let mut remaining = text.char_indices();
    let mut positions = Vec::with_capacity(query.len());

    for qc in query.chars() {
        let (pos, _) = remaining.find(|&(_, tc)| eq_ignore_case(tc, qc))?;
        positions.push(pos);
    }

    Some(positions)
}

/// Score a match found by [`match_positions`]. Always at least 1.
pub fn score(text: &str, query: &str, positions: &[usize]) -> i64 {
    let (Some(&first), Some(&last)) = (positions.first(), positions.last()) else {
        return 0;
    };

    let mut score = BASE_SCORE;

    // Contiguous runs
    for pair in positions.windows(2) {
        if pair[1] == pair[0] + char_len_at(text, pair[0]) {
            score += ADJACENT_BONUS;
        }
    }

    // Early start
    if first == 0 {
        score += START_BONUS;
    } else if first < 5 {
        score += 50 - 10 * first as i64;
    }

    // Matched character has the same case as typed
    for (&pos, qc) in positions.iter().zip(query.chars()) {
        if text[pos..].chars().next() == Some(qc) {
            score += CASE_BONUS;
        }
    }

    // Scattered matches
    let spread = last - first;
    if spread > query.len() {
        score -= SPREAD_PENALTY * (spread - query.len()) as i64;
    }

    score.max(1)
}

fn eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn char_len_at(text: &str, pos: usize) -> usize {
    text[pos..].chars().next().map_or(1, char::len_utf8)
}
