//! Command line argument parsing for the docindex CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// docindex - manage on-disk document indexes
#[derive(Parser, Debug, Clone)]
#[command(name = "docindex")]
#[command(about = "Discover, load, search and remove on-disk document indexes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct DocIndexArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Directory holding one sub-directory per index
    #[arg(long, env = "DOCINDEX_STORAGE_ROOT", global = true)]
    pub storage_root: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long, value_name = "CONFIG_FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl DocIndexArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List catalogued indexes
    List,

    /// Show discovery, residency and size of every index
    Status,

    /// Create a new empty index
    Create(NameArgs),

    /// Add plain-text files to an index
    Add(AddArgs),

    /// Search an index
    Search(SearchArgs),

    /// Stop tracking an index, keeping its files
    Remove(NameArgs),

    /// Stop tracking an index and delete its files
    Delete(NameArgs),

    /// Guess which index was built from a source directory
    Find(FindArgs),
}

/// Arguments naming a single index
#[derive(Parser, Debug, Clone)]
pub struct NameArgs {
    /// Index name
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Arguments for adding documents
#[derive(Parser, Debug, Clone)]
pub struct AddArgs {
    /// Index name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Text files to index
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<PathBuf>,

    /// Field the file content is stored in
    #[arg(long, default_value = "content", value_parser = parse_content_field)]
    pub field: String,
}

/// Field holding the source path of every added file.
pub const PATH_FIELD: &str = "path";

fn parse_content_field(field: &str) -> Result<String, String> {
    if field.is_empty() {
        Err("field name must not be empty".to_string())
    } else if field == PATH_FIELD {
        Err(format!("'{PATH_FIELD}' holds the file path and cannot store content"))
    } else {
        Ok(field.to_string())
    }
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Index name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Query string
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Field to search in (default: all fields)
    #[arg(long)]
    pub field: Option<String>,

    /// Maximum number of results to return
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

/// Arguments for directory lookup
#[derive(Parser, Debug, Clone)]
pub struct FindArgs {
    /// Source directory the index was built from
    #[arg(value_name = "DIRECTORY")]
    pub directory: PathBuf,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
