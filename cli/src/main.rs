use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sheek_engine::config::expand_path;
use sheek_engine::{
    import_history, search, CommandContext, Config, ContextRanker, ContextResolver, HistoryStore,
    ImportOptions, RecordPayload, SearchMode, SearchResults, Shell,
};
use tracing::debug;

/// Environment variable holding the query a shell widget starts with
const INITIAL_QUERY_VAR: &str = "SHEEK_INITIAL_QUERY";

#[derive(Parser)]
#[command(name = "sheek")]
#[command(about = "Context-aware shell history search")]
struct Cli {
    /// History log to use instead of the configured one
    #[arg(long, global = true)]
    history: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search command history
    Search {
        /// Search query (defaults to $SHEEK_INITIAL_QUERY)
        query: Option<String>,
        /// Matching algorithm: exact or fuzzy
        #[arg(short, long)]
        mode: Option<SearchMode>,
        /// Maximum results (0 = all)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Directory whose context boosts results
        #[arg(long)]
        cwd: Option<PathBuf>,
        /// Skip the context boost
        #[arg(long)]
        no_context: bool,
        /// Output commands only, one per line (for piping to fzf, etc.)
        #[arg(long, conflicts_with = "json")]
        plain: bool,
        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record an executed command
    Record {
        /// Command string (use named arg to avoid clap treating -flags as options)
        #[arg(long, allow_hyphen_values = true)]
        cmd: String,
        /// Working directory
        #[arg(long)]
        cwd: Option<PathBuf>,
        /// Repository name override
        #[arg(long)]
        repo: Option<String>,
        /// Branch override
        #[arg(long)]
        branch: Option<String>,
        /// Workspace root override
        #[arg(long)]
        workspace: Option<String>,
        /// Execution time (unix epoch seconds)
        #[arg(long)]
        ts: Option<i64>,
    },
    /// Import history from a shell history file
    Import {
        /// Shell format: zsh, bash or fish
        #[arg(long)]
        shell: Shell,
        /// History file (defaults to the shell's usual location)
        #[arg(long)]
        source: Option<PathBuf>,
        /// Import only the most recent N commands (0 = all)
        #[arg(short, long, default_value = "0")]
        limit: usize,
        /// Replace the sheek log instead of appending to it
        #[arg(long)]
        replace: bool,
    },
    /// Print the context of a directory
    Context {
        /// Working directory
        #[arg(long)]
        cwd: Option<PathBuf>,
    },
}

/// Search options after merging flags with the config
struct SearchRequest {
    query: String,
    mode: SearchMode,
    limit: usize,
    cwd: Option<PathBuf>,
    contextual: bool,
    output: Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Pretty,
    Plain,
    Json,
}

#[derive(Serialize)]
struct SearchHit<'a> {
    index: usize,
    command: &'a str,
    timestamp: i64,
    boost: i64,
    context: &'a CommandContext,
    positions: &'a [usize],
}

fn history_path(cli_path: Option<&Path>, config: &Config) -> Result<PathBuf> {
    match cli_path {
        Some(path) => Ok(expand_path(path)),
        None => config
            .history_path()
            .context("Failed to determine history location"),
    }
}

fn resolve_dir(cwd: Option<PathBuf>) -> Result<PathBuf> {
    match cwd {
        Some(dir) => Ok(expand_path(&dir)),
        None => std::env::current_dir().context("Failed to read current directory"),
    }
}

fn cmd_search(store: &HistoryStore, config: &Config, request: SearchRequest) -> Result<()> {
    let commands = match store.load() {
        Ok(commands) => commands,
        Err(e) if e.is_history_not_found() => {
            eprintln!(
                "No sheek history at {} yet. Record commands with `sheek record` or run `sheek import --shell <shell>`.",
                store.path().display()
            );
            if request.output == Output::Json {
                println!("[]");
            }
            return Ok(());
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to load history from {}", store.path().display()));
        }
    };

    let commands = if request.contextual {
        let dir = resolve_dir(request.cwd)?;
        let current = ContextResolver::new().resolve(&dir);
        debug!("Boosting against context {:?}", current);
        ContextRanker::new(config.boost).apply(commands, &current)
    } else {
        commands
    };

    let results = search(&commands, &request.query, request.mode);
    print_results(&results, request.limit, request.output)
}

fn print_results(results: &SearchResults, limit: usize, output: Output) -> Result<()> {
    let take = if limit == 0 { usize::MAX } else { limit };
    let shown = results.commands.iter().take(take);

    match output {
        Output::Plain => {
            for cmd in shown {
                println!("{}", cmd.text);
            }
        }
        Output::Json => {
            let hits: Vec<SearchHit> = shown
                .map(|cmd| SearchHit {
                    index: cmd.index,
                    command: &cmd.text,
                    timestamp: cmd.timestamp,
                    boost: cmd.context_boost,
                    context: &cmd.context,
                    positions: results.positions_for(cmd.index),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
        Output::Pretty => {
            if results.is_empty() {
                println!("No results found");
            }
            for cmd in shown {
                let text = highlight(&cmd.text, results.positions_for(cmd.index));
                if cmd.context.directory.is_empty() {
                    println!("{:>5}  {}", cmd.context_boost, text);
                } else {
                    println!("{:>5}  {} @ {}", cmd.context_boost, text, cmd.context.directory);
                }
            }
        }
    }

    Ok(())
}

/// Wrap the characters at the given byte offsets in brackets
fn highlight(text: &str, positions: &[usize]) -> String {
    if positions.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + positions.len() * 2);
    for (offset, c) in text.char_indices() {
        if positions.binary_search(&offset).is_ok() {
            out.push('[');
            out.push(c);
            out.push(']');
        } else {
            out.push(c);
        }
    }
    out
}

fn cmd_record(store: &HistoryStore, payload: RecordPayload) -> Result<()> {
    let record = store
        .record(&payload, &ContextResolver::new())
        .with_context(|| format!("Failed to record command in {}", store.path().display()))?;
    debug!("Recorded {:?}", record);
    Ok(())
}

fn cmd_import(store: &HistoryStore, options: ImportOptions) -> Result<()> {
    let count = import_history(&options, store)
        .with_context(|| format!("Failed to import {} history", options.shell))?;
    eprintln!(
        "Imported {} {} commands into {}",
        count,
        options.shell,
        store.path().display()
    );
    Ok(())
}

fn cmd_context(cwd: Option<PathBuf>) -> Result<()> {
    let dir = resolve_dir(cwd)?;
    let ctx = ContextResolver::new().resolve(&dir);
    for line in context_lines(&ctx) {
        println!("{}", line);
    }
    Ok(())
}

fn context_lines(ctx: &CommandContext) -> Vec<String> {
    [
        ("directory", &ctx.directory),
        ("repository", &ctx.repository),
        ("branch", &ctx.branch),
        ("workspace", &ctx.workspace),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(key, value)| format!("{}={}", key, value))
    .collect()
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sheek=warn,sheek_engine=warn"));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load config")?;
    let store = HistoryStore::new(history_path(cli.history.as_deref(), &config)?);

    match cli.command {
        Commands::Search {
            query,
            mode,
            limit,
            cwd,
            no_context,
            plain,
            json,
        } => {
            let query = query
                .or_else(|| std::env::var(INITIAL_QUERY_VAR).ok())
                .unwrap_or_default();
            let output = if json {
                Output::Json
            } else if plain {
                Output::Plain
            } else {
                Output::Pretty
            };
            let request = SearchRequest {
                query,
                mode: mode.unwrap_or(config.mode),
                limit: limit.unwrap_or(config.max_items),
                cwd,
                contextual: config.contextual && !no_context,
                output,
            };
            cmd_search(&store, &config, request)?;
        }
        Commands::Record {
            cmd,
            cwd,
            repo,
            branch,
            workspace,
            ts,
        } => {
            let payload = RecordPayload {
                command: cmd,
                directory: cwd.map(|dir| expand_path(&dir)),
                repository: repo,
                branch,
                workspace,
                timestamp: ts,
            };
            cmd_record(&store, payload)?;
        }
        Commands::Import {
            shell,
            source,
            limit,
            replace,
        } => {
            let options = ImportOptions {
                shell,
                source,
                limit,
                append: !replace,
            };
            cmd_import(&store, options)?;
        }
        Commands::Context { cwd } => cmd_context(cwd)?,
    }

    Ok(())
}
