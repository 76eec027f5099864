//! sheek engine: context-aware shell history search.
//!
//! Loads the persisted JSONL history, boosts commands run in a context
//! similar to the current one, and filters them with exact or fuzzy
//! matching. Also imports zsh, bash and fish history files.

pub mod config;
pub mod context;
pub mod error;
pub mod import;
pub mod ranking;
pub mod record;
pub mod search;
pub mod store;

pub use config::Config;
pub use context::ContextResolver;
pub use error::{Error, Result};
pub use import::{import_history, ImportOptions, Shell};
pub use ranking::{BoostWeights, ContextRanker};
pub use record::{Command, CommandContext, CommandSource, HistoryRecord};
pub use search::{search, SearchMode, SearchResults};
pub use store::{HistoryStore, RecordPayload};
