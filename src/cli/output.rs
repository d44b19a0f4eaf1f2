//! Output formatting for CLI commands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cli::args::{DocIndexArgs, OutputFormat};
use crate::error::Result;
use crate::index::search::SearchHit;
use crate::manager::IndexMemoryStatus;

/// A command result that can also be printed for humans.
pub trait HumanOutput: Serialize {
    fn print_human(&self);
}

/// Result structure for listing indexes.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexListResult {
    pub storage_root: String,
    pub indexes: Vec<String>,
}

/// Memory residency of every index.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusReport {
    pub storage_root: String,
    pub indexes: BTreeMap<String, IndexMemoryStatus>,
    pub total_estimated_memory_mb: f64,
}

/// Result structure for index creation.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexCreationResult {
    pub name: String,
    pub path: String,
}

/// Result structure for document addition.
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentAdditionResult {
    pub name: String,
    pub documents_added: usize,
    pub total_documents: u64,
    pub duration_ms: u64,
}

/// Result structure for search operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResults {
    pub name: String,
    pub query: String,
    pub hits: Vec<SearchHit>,
    pub total_hits: usize,
    pub duration_ms: u64,
}

/// Result structure for remove and delete.
#[derive(Debug, Serialize, Deserialize)]
pub struct RemovalResult {
    pub name: String,
    /// Whether the index was catalogued.
    pub removed: bool,
    pub deleted_from_disk: bool,
}

/// Result structure for directory lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct FindResult {
    pub directory: String,
    pub index: Option<String>,
}

/// Output a result in the specified format.
pub fn output_result<T: HumanOutput>(message: &str, result: &T, args: &DocIndexArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 0 {
                println!("{message}");
                println!();
            }
            result.print_human();
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &DocIndexArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

impl HumanOutput for IndexListResult {
    fn print_human(&self) {
        println!("Storage root: {}", self.storage_root);
        if self.indexes.is_empty() {
            println!("No indexes found.");
        }
        for name in &self.indexes {
            println!("  {name}");
        }
    }
}

impl HumanOutput for StatusReport {
    fn print_human(&self) {
        println!("Index Status:");
        println!("═════════════");

        let width = self.indexes.keys().map(String::len).max().unwrap_or(0).max(5);
        println!("{:<width$}  {:<8}  {:>10}", "Index", "Loaded", "Memory");
        for (name, status) in &self.indexes {
            println!(
                "{name:<width$}  {:<8}  {:>10}",
                if status.loaded { "yes" } else { "no" },
                format_mb(status.estimated_memory_mb)
            );
        }

        println!();
        println!(
            "Total estimated memory: {}",
            format_mb(self.total_estimated_memory_mb)
        );
    }
}

impl HumanOutput for IndexCreationResult {
    fn print_human(&self) {
        println!("name: {}", self.name);
        println!("path: {}", self.path);
    }
}

impl HumanOutput for DocumentAdditionResult {
    fn print_human(&self) {
        println!("Documents added: {}", self.documents_added);
        println!("Total documents: {}", self.total_documents);
        println!("Duration: {}ms", self.duration_ms);
    }
}

impl HumanOutput for SearchResults {
    fn print_human(&self) {
        println!("Search Results:");
        println!("═══════════════");

        for (i, hit) in self.hits.iter().enumerate() {
            println!();
            println!("Result {}: (Score: {:.3})", i + 1, hit.score);
            println!("─────────────");

            for (field_name, text) in hit.document.fields() {
                println!("{field_name}: {}", truncate(text, 200));
            }
        }

        println!();
        println!("Total hits: {}", self.total_hits);
        println!("Search time: {}ms", self.duration_ms);
    }
}

impl HumanOutput for RemovalResult {
    fn print_human(&self) {
        if !self.removed {
            println!("{} was not tracked", self.name);
        }
        if self.deleted_from_disk {
            println!("{} deleted from disk", self.name);
        }
    }
}

impl HumanOutput for FindResult {
    fn print_human(&self) {
        match &self.index {
            Some(index) => println!("{}: {index}", self.directory),
            None => println!("{}: no matching index", self.directory),
        }
    }
}

/// Format a megabyte figure for display.
fn format_mb(mb: f64) -> String {
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else {
        format!("{mb:.2} MB")
    }
}

/// Shorten `text` to at most `max_chars` characters.
fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_string(),
    }
}
