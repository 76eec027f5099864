//! zsh extended history parser.
//!
//! Format: `: <epoch>:<duration>;<command>`, with multi-line commands
//! continuing on the following lines until the next marker.

use tracing::debug;

use crate::record::HistoryRecord;

/// Accumulator state between lines
#[derive(Debug)]
enum State {
    /// No marker seen yet; stray lines are dropped
    Idle,
    /// Collecting the text of the current record
    Accumulating { timestamp: i64, text: String },
}

/// Line-by-line zsh history parser
#[derive(Debug)]
struct Parser {
    state: State,
    records: Vec<HistoryRecord>,
}

impl Parser {
    fn new() -> Self {
        Self {
            state: State::Idle,
            records: Vec::new(),
        }
    }

    fn feed(&mut self, line: &str) {
        if let Some((timestamp, command)) = parse_marker(line) {
            self.flush();
            self.state = State::Accumulating {
                timestamp,
                text: command.to_string(),
            };
            return;
        }

        match &mut self.state {
            State::Idle => debug!("Dropping zsh history line before first marker"),
            State::Accumulating { text, .. } => {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(line);
            }
        }
    }

    /// Emit the current record, if any, and go back to idle
    fn flush(&mut self) {
        if let State::Accumulating { timestamp, text } =
            std::mem::replace(&mut self.state, State::Idle)
        {
            let text = text.trim();
            if !text.is_empty() {
                self.records.push(HistoryRecord::bare(text, timestamp));
            }
        }
    }

    fn finish(mut self) -> Vec<HistoryRecord> {
        self.flush();
        self.records
    }
}

/// Split a `: <epoch>:<duration>;<command>` marker line
fn parse_marker(line: &str) -> Option<(i64, &str)> {
    let rest = line.strip_prefix(": ")?;
    let (epoch, rest) = rest.split_once(':')?;
    let (duration, command) = rest.split_once(';')?;

    if !is_digits(epoch) || !is_digits(duration) {
        return None;
    }

    // digits that overflow still mark a record; the timestamp is clamped later
    let timestamp = epoch.parse::<i64>().unwrap_or(0);
    Some((timestamp, command))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse zsh history lines into chronological records
pub fn parse<S: AsRef<str>>(lines: &[S]) -> Vec<HistoryRecord> {
    let mut parser = Parser::new();
    for line in lines {
        parser.feed(line.as_ref());
    }
    parser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_marker() {
        assert_eq!(parse_marker(": 1700000000:0;git status"), Some((1700000000, "git status")));
        assert_eq!(parse_marker(": 1:12;"), Some((1, "")));
        assert_eq!(parse_marker(": 5:0;echo a;b"), Some((5, "echo a;b")));
        assert_eq!(parse_marker("git status"), None);
        assert_eq!(parse_marker(": abc:0;ls"), None);
        assert_eq!(parse_marker(": 123;ls"), None);
        assert_eq!(parse_marker(": :0;ls"), None);
    }

    #[test]
    fn test_stray_leading_line_and_continuation() {
        let lines = [
            "orphan line",
            ": 1700000000:0;ls -la",
            ": 1700000005:2;echo one \\",
            "two",
        ];
        let records = parse(&lines);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].command, "ls -la");
        assert_eq!(records[0].timestamp, 1700000000);
        assert_eq!(records[1].command, "echo one \\\ntwo");
        assert_eq!(records[1].timestamp, 1700000005);
    }

    #[test]
    fn test_empty_commands_discarded() {
        let lines = [": 10:0;   ", ": 11:0;pwd", ": 12:0;"];
        let records = parse(&lines);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].command, "pwd");
    }

    #[test]
    fn test_marker_with_empty_first_line() {
        let lines = [": 20:0;", "for i in 1 2; do", "echo $i; done"];
        let records = parse(&lines);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].command, "for i in 1 2; do\necho $i; done");
    }

    #[test]
    fn test_zero_timestamp_clamped() {
        let records = parse(&[": 0:0;true"]);
        assert_eq!(records[0].timestamp, 1);
    }

    #[test]
    fn test_overflowing_epoch_still_starts_record() {
        let lines = [": 10:0;ls", ": 99999999999999999999:0;pwd"];
        let records = parse(&lines);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].command, "ls");
        assert_eq!(records[1].command, "pwd");
        assert_eq!(records[1].timestamp, 1);
    }

    #[test]
    fn test_no_markers_no_records() {
        let records = parse(&["ls", "pwd"]);
        assert!(records.is_empty());
    }
}
