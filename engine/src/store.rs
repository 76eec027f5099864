//! Persisted history log.
//!
//! Newline-delimited JSON, one `HistoryRecord` per line, appended by the
//! shell hook and optionally rewritten wholesale by an import. There is no
//! locking; a torn last line is tolerated because loading skips anything
//! that does not parse.

use std::fs::{DirBuilder, OpenOptions};
use std::io::{BufWriter, Write};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::config_dir;
use crate::context::{absolute_clean, ContextResolver};
use crate::error::{Error, Result};
use crate::record::{
    clamp_timestamp, commands_from_records, decode_line, encode_record, now_timestamp, Command,
    CommandSource, HistoryRecord,
};

/// File name of the log inside the sheek config directory
pub const HISTORY_FILE_NAME: &str = ".sheek_history";

/// A single command to record, as reported by a shell hook
#[derive(Debug, Clone, Default)]
pub struct RecordPayload {
    pub command: String,
    /// Working directory; the process cwd when `None`
    pub directory: Option<PathBuf>,
    /// Overrides for the resolved context
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub workspace: Option<String>,
    /// Unix seconds; now when `None` or not positive
    pub timestamp: Option<i64>,
}

/// Handle on the JSONL history log
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    /// `~/.config/sheek/.sheek_history`
    pub fn default_path() -> Result<PathBuf> {
        Ok(config_dir()?.join(HISTORY_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every command in file order.
    ///
    /// A missing log is `Error::HistoryNotFound`. Blank and malformed lines
    /// are skipped.
    pub fn load(&self) -> Result<Vec<Command>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::HistoryNotFound {
                    path: self.path.clone(),
                });
            }
            Err(e) => return Err(Error::io(&self.path, e)),
        };

        let content = String::from_utf8_lossy(&bytes);
        let commands = parse_log(&content);
        debug!("Loaded {} commands from {}", commands.len(), self.path.display());
        Ok(commands)
    }

    /// Append records; returns how many were written
    pub fn append(&self, records: &[HistoryRecord]) -> Result<usize> {
        self.write(records, true)
    }

    /// Truncate the log and write `records`; returns how many were written
    pub fn replace(&self, records: &[HistoryRecord]) -> Result<usize> {
        self.write(records, false)
    }

    fn write(&self, records: &[HistoryRecord], append: bool) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = self.path.parent() {
            DirBuilder::new()
                .recursive(true)
                .mode(0o700)
                .create(parent)
                .map_err(|e| Error::io(parent, e))?;
        }

        let mut options = OpenOptions::new();
        options.create(true).write(true).mode(0o600);
        if append {
            options.append(true);
        } else {
            options.truncate(true);
        }

        let file = options
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        let mut writer = BufWriter::new(file);

        let mut written = 0;
        for record in records {
            if record.command.trim().is_empty() {
                debug!("Not writing record with empty command");
                continue;
            }
            let line = encode_record(record)?;
            writeln!(writer, "{}", line).map_err(|e| Error::io(&self.path, e))?;
            written += 1;
        }
        writer.flush().map_err(|e| Error::io(&self.path, e))?;

        info!(
            "{} {} records to {}",
            if append { "Appended" } else { "Wrote" },
            written,
            self.path.display()
        );
        Ok(written)
    }

    /// Record one executed command with its resolved context.
    ///
    /// Blank commands are rejected before anything touches the disk.
    pub fn record(&self, payload: &RecordPayload, resolver: &ContextResolver) -> Result<HistoryRecord> {
        if payload.command.trim().is_empty() {
            return Err(Error::EmptyCommand);
        }

        let directory = match &payload.directory {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => std::env::current_dir().map_err(|e| Error::io(".", e))?,
        };
        let directory = absolute_clean(&directory);

        let mut ctx = resolver.resolve(&directory);
        override_field(&mut ctx.repository, payload.repository.as_deref());
        override_field(&mut ctx.branch, payload.branch.as_deref());
        override_field(&mut ctx.workspace, payload.workspace.as_deref());

        let timestamp = payload
            .timestamp
            .filter(|ts| *ts > 0)
            .unwrap_or_else(now_timestamp);

        let record = HistoryRecord::new(payload.command.trim(), clamp_timestamp(timestamp), &ctx);
        self.append(std::slice::from_ref(&record))?;
        Ok(record)
    }
}

fn override_field(field: &mut String, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        *field = value.to_string();
    }
}

/// Parse log content into native commands with 1-based indices
pub fn parse_log(content: &str) -> Vec<Command> {
    commands_from_records(content.lines().filter_map(decode_line), CommandSource::Native)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CommandContext;
    use std::os::unix::fs::PermissionsExt;

    fn temp_store() -> (tempfile::TempDir, HistoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("sheek").join(HISTORY_FILE_NAME));
        (dir, store)
    }

    fn no_git() -> ContextResolver {
        ContextResolver::with_program("sheek-no-such-git-binary")
    }

    #[test]
    fn test_missing_log_is_not_found() {
        let (_dir, store) = temp_store();
        let err = store.load().unwrap_err();
        assert!(err.is_history_not_found());
    }

    #[test]
    fn test_append_then_load() {
        let (_dir, store) = temp_store();
        let ctx = CommandContext {
            directory: "/srv/app".to_string(),
            repository: "app".to_string(),
            branch: "main".to_string(),
            workspace: "/srv/app".to_string(),
        };

        store
            .append(&[
                HistoryRecord::new("make", 100, &ctx),
                HistoryRecord::bare("ls", 200),
            ])
            .unwrap();
        store.append(&[HistoryRecord::bare("pwd", 300)]).unwrap();

        let commands = store.load().unwrap();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0].index, 1);
        assert_eq!(commands[0].context, ctx);
        assert_eq!(commands[0].source, CommandSource::Native);
        assert_eq!(commands[2].index, 3);
        assert_eq!(commands[2].text, "pwd");
    }

    #[test]
    fn test_replace_truncates() {
        let (_dir, store) = temp_store();
        store.append(&[HistoryRecord::bare("old", 1)]).unwrap();
        store.replace(&[HistoryRecord::bare("new", 2)]).unwrap();

        let commands = store.load().unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].text, "new");
    }

    #[test]
    fn test_blank_records_never_written() {
        let (_dir, store) = temp_store();
        let written = store
            .append(&[HistoryRecord::bare("  ", 1), HistoryRecord::bare("ls", 2)])
            .unwrap();
        assert_eq!(written, 1);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw.lines().count(), 1);
    }

    #[test]
    fn test_corrupt_lines_skipped() {
        let (_dir, store) = temp_store();
        store.append(&[HistoryRecord::bare("first", 1)]).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(store.path()).unwrap();
            writeln!(file, "{{\"cmd\": broken").unwrap();
            writeln!(file).unwrap();
        }
        store.append(&[HistoryRecord::bare("second", 2)]).unwrap();
        {
            // torn final line
            let mut file = OpenOptions::new().append(true).open(store.path()).unwrap();
            write!(file, "{{\"cmd\":\"thi").unwrap();
        }

        let commands = store.load().unwrap();
        let texts: Vec<&str> = commands.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(commands[1].index, 2);
    }

    #[test]
    fn test_owner_only_permissions() {
        let (_dir, store) = temp_store();
        store.append(&[HistoryRecord::bare("ls", 1)]).unwrap();

        let file_mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(file_mode & 0o777, 0o600);
        let dir_mode = std::fs::metadata(store.path().parent().unwrap())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(dir_mode & 0o777, 0o700);
    }

    #[test]
    fn test_empty_batch_does_not_create_file() {
        let (_dir, store) = temp_store();
        assert_eq!(store.append(&[]).unwrap(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_record_rejects_empty_command() {
        let (_dir, store) = temp_store();
        let payload = RecordPayload {
            command: " \t ".to_string(),
            ..Default::default()
        };
        assert!(matches!(store.record(&payload, &no_git()), Err(Error::EmptyCommand)));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_record_with_overrides() {
        let (dir, store) = temp_store();
        let payload = RecordPayload {
            command: "cargo test".to_string(),
            directory: Some(dir.path().join("work/./sub/..")),
            repository: Some("widgets".to_string()),
            branch: Some("feature/x".to_string()),
            workspace: None,
            timestamp: Some(1700000000),
        };

        let record = store.record(&payload, &no_git()).unwrap();
        assert_eq!(record.timestamp, 1700000000);
        assert_eq!(
            PathBuf::from(&record.directory),
            absolute_clean(&dir.path().join("work"))
        );
        assert_eq!(record.repository, "widgets");
        assert_eq!(record.branch, "feature/x");
        assert_eq!(record.workspace, "");

        let commands = store.load().unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].context.repository, "widgets");
    }

    #[test]
    fn test_record_trims_command() {
        let (_dir, store) = temp_store();
        let payload = RecordPayload {
            command: "  git status\n".to_string(),
            timestamp: Some(5),
            ..Default::default()
        };
        let record = store.record(&payload, &no_git()).unwrap();
        assert_eq!(record.command, "git status");
        assert_eq!(store.load().unwrap()[0].text, "git status");
    }

    #[test]
    fn test_record_defaults_timestamp_to_now() {
        let (_dir, store) = temp_store();
        let payload = RecordPayload {
            command: "ls".to_string(),
            timestamp: Some(0),
            ..Default::default()
        };
        let record = store.record(&payload, &no_git()).unwrap();
        assert!(record.timestamp > 1_600_000_000);
        assert!(!record.directory.is_empty());
    }

    #[test]
    fn test_parse_log() {
        let content = "{\"cmd\":\"a\",\"ts\":1}\nnot json\n{\"cmd\":\"b\",\"ts\":\"x\"}\n";
        let commands = parse_log(content);
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[1].text, "b");
        assert_eq!(commands[1].timestamp, 1);
        assert_eq!(commands[1].index, 2);
    }
}
