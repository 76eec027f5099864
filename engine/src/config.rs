//! User configuration, read from `~/.config/sheek/config.json`.
//!
//! An invalid `mode` or `max_items` falls back to its default with a
//! warning rather than failing, so the shell hook keeps recording.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ranking::BoostWeights;
use crate::search::SearchMode;
use crate::store::HistoryStore;

pub const CONFIG_FILE_NAME: &str = "config.json";

/// Settings for searching and storing history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Default search mode (default: exact)
    #[serde(default, deserialize_with = "lenient_mode")]
    pub mode: SearchMode,
    /// Apply the context boost before searching (default: true)
    #[serde(default = "default_contextual")]
    pub contextual: bool,
    /// Number of results to show (default: 10)
    #[serde(default = "default_max_items", deserialize_with = "lenient_max_items")]
    pub max_items: usize,
    /// Override for the history log location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_file: Option<PathBuf>,
    #[serde(default)]
    pub boost: BoostWeights,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: SearchMode::default(),
            contextual: default_contextual(),
            max_items: default_max_items(),
            history_file: None,
            boost: BoostWeights::default(),
        }
    }
}

fn default_contextual() -> bool { true }
fn default_max_items() -> usize { 10 }

/// Any spelling `SearchMode::from_str` accepts; anything else is the default
fn lenient_mode<'de, D>(deserializer: D) -> std::result::Result<SearchMode, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let mode = match value.as_str().map(str::parse::<SearchMode>) {
        Some(Ok(mode)) => mode,
        _ => {
            warn!("Invalid search mode {} in config, using {}", value, SearchMode::default());
            SearchMode::default()
        }
    };
    Ok(mode)
}

/// Positive integers only; zero, negatives and non-numbers give the default
fn lenient_max_items<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let max_items = match value.as_u64() {
        Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX),
        _ => {
            warn!("Invalid max_items {} in config, using {}", value, default_max_items());
            default_max_items()
        }
    };
    Ok(max_items)
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        Ok(config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path`; a missing file gives the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(Error::Config {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        };

        serde_json::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Configured log path with `~` expanded, or the default location
    pub fn history_path(&self) -> Result<PathBuf> {
        match &self.history_file {
            Some(path) => Ok(expand_path(path)),
            None => HistoryStore::default_path(),
        }
    }
}

/// `~/.config/sheek` on every platform, where the shell hooks expect it
pub fn config_dir() -> Result<PathBuf> {
    let home = match directories::BaseDirs::new() {
        Some(dirs) => dirs.home_dir().to_path_buf(),
        None => match std::env::var_os("HOME") {
            Some(home) if !home.is_empty() => PathBuf::from(home),
            _ => return Err(Error::NoHomeDir),
        },
    };
    Ok(home.join(".config").join("sheek"))
}

pub fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.mode, SearchMode::Exact);
        assert!(config.contextual);
        assert_eq!(config.max_items, 10);
        assert!(config.history_file.is_none());
        assert_eq!(config.boost.directory_exact, 400);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"mode": "fuzzy", "max_items": 25, "boost": {"branch": 10}}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.mode, SearchMode::Fuzzy);
        assert_eq!(config.max_items, 25);
        assert!(config.contextual);
        assert_eq!(config.boost.branch, 10);
        assert_eq!(config.boost.repository, 200);
    }

    #[test]
    fn test_unparsable_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config { .. })));

        std::fs::write(&path, r#"{"contextual": "yes"}"#).unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config { .. })));
    }

    #[test]
    fn test_mode_any_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"mode": "Fuzzy", "max_items": 0}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.mode, SearchMode::Fuzzy);
        assert_eq!(config.max_items, 10);
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"mode": "regex", "max_items": -3, "contextual": false}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.mode, SearchMode::Exact);
        assert_eq!(config.max_items, 10);
        assert!(!config.contextual);

        std::fs::write(&path, r#"{"mode": 7, "max_items": "many"}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.mode, SearchMode::Exact);
        assert_eq!(config.max_items, 10);
    }

    #[test]
    fn test_config_dir_under_dot_config() {
        if let Ok(dir) = config_dir() {
            assert!(dir.ends_with(".config/sheek"));
        }
    }

    #[test]
    fn test_history_path_override() {
        let config = Config {
            history_file: Some(PathBuf::from("/var/tmp/hist.jsonl")),
            ..Default::default()
        };
        assert_eq!(config.history_path().unwrap(), PathBuf::from("/var/tmp/hist.jsonl"));
    }

    #[test]
    fn test_history_path_default() {
        if let Ok(path) = Config::default().history_path() {
            assert!(path.ends_with(".config/sheek/.sheek_history"));
        }
    }
}
