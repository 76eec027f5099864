//! fish history parser.
//!
//! fish writes a YAML-like list:
//!
//! ```text
//! - cmd: git status
//!   when: 1700000000
//!   paths:
//!     - src
//! ```
//!
//! Older files use `time:` instead of `when:`.

use crate::record::{clamp_timestamp, HistoryRecord};

/// Record being collected
#[derive(Debug)]
struct Pending {
    text: String,
    timestamp: Option<i64>,
}

/// Parse fish history lines into records; missing timestamps become `now`
pub fn parse<S: AsRef<str>>(lines: &[S], now: i64) -> Vec<HistoryRecord> {
    let mut records = Vec::new();
    let mut current: Option<Pending> = None;

    for line in lines {
        let line = line.as_ref().trim();

        if let Some(cmd) = line.strip_prefix("- cmd:") {
            flush(&mut records, current.take(), now);
            current = Some(Pending {
                text: unescape(cmd.trim()),
                timestamp: None,
            });
        } else if let Some(value) = line
            .strip_prefix("when:")
            .or_else(|| line.strip_prefix("time:"))
        {
            if let Some(pending) = current.as_mut() {
                pending.timestamp = value.trim().parse::<i64>().ok();
            }
        }
    }
    flush(&mut records, current, now);

    records
}

fn flush(records: &mut Vec<HistoryRecord>, pending: Option<Pending>, now: i64) {
    let Some(pending) = pending else {
        return;
    };
    let text = pending.text.trim();
    if text.is_empty() {
        return;
    }
    let timestamp = pending.timestamp.unwrap_or(now);
    records.push(HistoryRecord::bare(text, clamp_timestamp(timestamp)));
}

/// Undo fish's escaping of newlines and backslashes
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}
