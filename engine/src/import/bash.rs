//! bash history parser.
//!
//! bash stores one command per line with the newest written last and no
//! timestamps. Walking backwards from the end, the newest command gets
//! `now` and each older one a second less, then the records are put back
//! in chronological order.

use crate::record::HistoryRecord;

/// Parse bash history lines into chronological records with synthetic timestamps
pub fn parse<S: AsRef<str>>(lines: &[S], now: i64) -> Vec<HistoryRecord> {
    let mut records = Vec::with_capacity(lines.len());
    let mut timestamp = now;

    for line in lines.iter().rev() {
        let text = line.as_ref().trim();
        if text.is_empty() {
            continue;
        }
        records.push(HistoryRecord::bare(text, timestamp));
        timestamp -= 1;
    }

    records.reverse();
    records
}
