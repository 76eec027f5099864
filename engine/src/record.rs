//! Canonical command model and the JSON-line record schema of the history log.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Where a command came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandSource {
    /// Bare shell history line without execution metadata
    #[default]
    Unknown,
    /// Loaded from sheek's own log, carries context
    Native,
}

/// Execution environment of a command. Empty fields mean "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandContext {
    /// Absolute, cleaned working directory
    pub directory: String,
    /// Final path segment of the workspace
    pub repository: String,
    /// VCS branch name
    pub branch: String,
    /// Repository top-level directory
    pub workspace: String,
}

impl CommandContext {
    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
            && self.repository.is_empty()
            && self.branch.is_empty()
            && self.workspace.is_empty()
    }
}

/// One historical invocation, as loaded for a single process run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    /// 1-based position in file order
    pub index: usize,
    /// Command text, may span several lines
    pub text: String,
    /// Seconds since the epoch, never below 1
    pub timestamp: i64,
    pub context: CommandContext,
    pub source: CommandSource,
    /// Score assigned by the context ranker; never persisted
    pub context_boost: i64,
}

/// On-disk form of a command: one JSON object per log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "cmd")]
    pub command: String,
    #[serde(rename = "ts", default = "default_timestamp", deserialize_with = "lenient_timestamp")]
    pub timestamp: i64,
    #[serde(rename = "cwd", default)]
    pub directory: String,
    #[serde(rename = "repo", default, skip_serializing_if = "String::is_empty")]
    pub repository: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub workspace: String,
}

impl HistoryRecord {
    /// Build a record from a command text, timestamp and its context
    pub fn new(command: impl Into<String>, timestamp: i64, context: &CommandContext) -> Self {
        Self {
            command: command.into(),
            timestamp: clamp_timestamp(timestamp),
            directory: context.directory.clone(),
            repository: context.repository.clone(),
            branch: context.branch.clone(),
            workspace: context.workspace.clone(),
        }
    }

    /// Record without any context, as produced by the shell importers
    pub fn bare(command: impl Into<String>, timestamp: i64) -> Self {
        Self::new(command, timestamp, &CommandContext::default())
    }

    pub fn context(&self) -> CommandContext {
        CommandContext {
            directory: self.directory.clone(),
            repository: self.repository.clone(),
            branch: self.branch.clone(),
            workspace: self.workspace.clone(),
        }
    }

    /// Convert into the in-memory model at the given 1-based position
    pub fn into_command(self, index: usize, source: CommandSource) -> Command {
        let context = self.context();
        Command {
            index,
            text: self.command,
            timestamp: clamp_timestamp(self.timestamp),
            context,
            source,
            context_boost: 0,
        }
    }
}

fn default_timestamp() -> i64 { 1 }

/// Accept any JSON value for `ts`; anything that is not a usable number becomes 1.
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let ts = match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(1),
        _ => 1,
    };
    Ok(clamp_timestamp(ts))
}

/// 0 and negative timestamps are reserved; clamp to 1
pub fn clamp_timestamp(ts: i64) -> i64 {
    ts.max(1)
}

/// Current Unix timestamp in seconds
pub fn now_timestamp() -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    clamp_timestamp(now)
}

/// Decode one log line. Blank, malformed and blank-command lines yield `None`.
pub fn decode_line(line: &str) -> Option<HistoryRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<HistoryRecord>(line) {
        Ok(record) if !record.command.trim().is_empty() => Some(record),
        Ok(_) => {
            debug!("Skipping history record with empty command");
            None
        }
        Err(e) => {
            debug!("Skipping malformed history line: {}", e);
            None
        }
    }
}

/// Encode a record as a single JSON line (without the trailing newline)
pub fn encode_record(record: &HistoryRecord) -> Result<String> {
    if record.command.trim().is_empty() {
        return Err(Error::EmptyCommand);
    }

    let mut record = record.clone();
    record.timestamp = clamp_timestamp(record.timestamp);
    Ok(serde_json::to_string(&record)?)
}

/// Turn records into commands with 1-based indices in iteration order
pub fn commands_from_records<I>(records: I, source: CommandSource) -> Vec<Command>
where
    I: IntoIterator<Item = HistoryRecord>,
{
    records
        .into_iter()
        .filter(|r| !r.command.trim().is_empty())
        .enumerate()
        .map(|(i, record)| record.into_command(i + 1, source))
        .collect()
}
