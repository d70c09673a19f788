//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use output::OutputFormat;

pub mod commands;
pub mod output;
pub mod progress;

/// hsearch - Hybrid lexical + vector document search with RRF fusion
#[derive(Parser, Debug)]
#[command(name = "hsearch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (human, json, plain)
    #[arg(long, short = 'O', global = true, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Enable machine-readable JSON output (shorthand for --output-format=json)
    #[arg(long, short = 'm', global = true)]
    pub machine: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ~/.config/hsearch/config.toml, then ./hsearch.toml)
    #[arg(long, global = true, env = "HS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Store backend override: elastic or memory
    #[arg(long, global = true, value_name = "BACKEND")]
    pub store: Option<String>,

    /// Store URL override
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Index to operate on (default: index.name from config)
    #[arg(long, short = 'i', global = true)]
    pub index: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Effective output format; an explicit `--output-format` wins over `--machine`.
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        if let Some(format) = self.output_format {
            return format;
        }
        if self.machine {
            return OutputFormat::Json;
        }
        OutputFormat::Human
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the index store is reachable
    Health(commands::health::HealthArgs),

    /// Create the index if it does not exist
    Ensure(commands::ensure::EnsureArgs),

    /// Bring the index to the configured schema version
    Migrate(commands::migrate::MigrateArgs),

    /// Delete and recreate the index (drops all documents)
    Reset(commands::reset::ResetArgs),

    /// Ingest documents from a JSON or NDJSON file
    Ingest(commands::ingest::IngestArgs),

    /// Hybrid search with text, a vector, or both
    Search(commands::search::SearchArgs),

    /// Fetch one document by id
    Get(commands::get::GetArgs),

    /// Count documents in the index
    Count(commands::count::CountArgs),

    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}
