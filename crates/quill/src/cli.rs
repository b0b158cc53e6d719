#![forbid(unsafe_code)]

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quill_core::markup;
use quill_core::snapshot::Snapshot;
use quill_runtime::config::EditorConfig;
use quill_runtime::persistence::{self, FileStorage, RestoreError, StorageBackend};
use quill_runtime::spellcheck::SpellChecker;

use crate::edit::run_edit;
use crate::error::{QuillError, Result};

/// Storage file used when `--storage` is not given.
pub const DEFAULT_STORAGE_FILE: &str = "quill-storage.json";

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "QUILL_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "quill",
    about = "Headless rich-text document editor with undo history and autosave",
    version
)]
pub struct Cli {
    /// Editor configuration file (TOML, or JSON with a .json extension).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// File backing the autosave store.
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_STORAGE_FILE)]
    pub storage: PathBuf,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Edit the autosaved document with directives read from stdin.
    Edit,

    /// Print the autosaved document, or the placeholder when there is none.
    Recover,

    /// Remove the autosaved document.
    Clear,

    /// Write the print-ready HTML of the autosaved document.
    Print {
        /// Output file.
        out: PathBuf,
    },

    /// List spelling suggestions for a word.
    Suggest { word: String },
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    run_with_io(cli, stdin.lock(), &mut stdout)
}

/// Run `cli` against explicit streams.
pub fn run_with_io<R: BufRead, W: Write>(cli: Cli, input: R, out: &mut W) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let storage = FileStorage::new(&cli.storage);
    tracing::debug!(
        target: "quill.cli",
        command = ?cli.command,
        storage = %cli.storage.display(),
        "running"
    );

    match cli.command {
        Commands::Edit => {
            let stats = run_edit(storage, config, input, out)?;
            writeln!(
                out,
                "session ended: {} commands, {} autosaves",
                stats.commands, stats.autosaves
            )?;
        }
        Commands::Recover => {
            let document = recover_document(&storage, &config)?;
            writeln!(out, "{document}")?;
        }
        Commands::Clear => {
            storage.clear(&config.autosave_key)?;
            writeln!(out, "cleared {}", config.autosave_key)?;
        }
        Commands::Print { out: path } => {
            let document = recover_document(&storage, &config)?;
            fs::write(&path, markup::print_document(document.as_str()))?;
            writeln!(out, "wrote {}", path.display())?;
        }
        Commands::Suggest { word } => {
            let suggestions = SpellChecker::default().suggestions(&word);
            if suggestions.is_empty() {
                writeln!(out, "no suggestions for {}", word.trim())?;
            }
            for suggestion in suggestions {
                writeln!(out, "{suggestion}")?;
            }
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    match path {
        Some(path) => Ok(EditorConfig::load(path)?),
        None => Ok(EditorConfig::default()),
    }
}

/// The autosaved document, or the placeholder when nothing usable is saved.
///
/// An unreadable store is an error here; the editor itself would silently
/// start over, which is not what someone asking to recover wants.
fn recover_document(storage: &dyn StorageBackend, config: &EditorConfig) -> Result<Snapshot> {
    match persistence::recover(storage, &config.autosave_key) {
        Ok(snapshot) => Ok(snapshot),
        Err(RestoreError::Unreadable { source, .. }) => Err(QuillError::Storage(source)),
        Err(RestoreError::Missing { .. } | RestoreError::Empty { .. }) => {
            Ok(Snapshot::from(config.placeholder.as_str()))
        }
    }
}

/// Install the stderr subscriber. Filter comes from `QUILL_LOG`, default `warn`.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_err() {
        tracing::debug!(target: "quill.cli", "subscriber already installed");
    }
}
