//! Command implementations for the docindex CLI.

use std::fs;
use std::time::Instant;

use log::info;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::IndexManagerConfig;
use crate::document::Document;
use crate::error::Result;
use crate::manager::IndexManager;

/// Execute a CLI command.
pub fn execute_command(args: DocIndexArgs) -> Result<()> {
    let manager = IndexManager::new(load_config(&args)?)?;

    match &args.command {
        Command::List => list_indexes(&manager, &args),
        Command::Status => show_status(&manager, &args),
        Command::Create(create_args) => create_index(&manager, create_args, &args),
        Command::Add(add_args) => add_documents(&manager, add_args, &args),
        Command::Search(search_args) => search_index(&manager, search_args, &args),
        Command::Remove(remove_args) => remove_index(&manager, remove_args, &args),
        Command::Delete(delete_args) => delete_index(&manager, delete_args, &args),
        Command::Find(find_args) => find_index(&manager, find_args, &args),
    }
}

/// Build the manager configuration from `--config` and `--storage-root`.
pub fn load_config(args: &DocIndexArgs) -> Result<IndexManagerConfig> {
    let mut config = match &args.config {
        Some(path) => IndexManagerConfig::from_file(path)?,
        None => IndexManagerConfig::default(),
    };

    if let Some(storage_root) = &args.storage_root {
        config.storage_root = storage_root.clone();
    }

    config.validate()?;
    Ok(config)
}

/// List catalogued indexes.
fn list_indexes(manager: &IndexManager, cli_args: &DocIndexArgs) -> Result<()> {
    output_result(
        "Indexes",
        &IndexListResult {
            storage_root: manager.storage_root_path().display().to_string(),
            indexes: manager.list_index_names(),
        },
        cli_args,
    )
}

/// Show memory residency of every index.
fn show_status(manager: &IndexManager, cli_args: &DocIndexArgs) -> Result<()> {
    let indexes = manager.get_index_memory_status();
    let total_estimated_memory_mb = indexes
        .values()
        .map(|status| status.estimated_memory_mb)
        .sum();

    output_result(
        "Index status",
        &StatusReport {
            storage_root: manager.storage_root_path().display().to_string(),
            indexes,
            total_estimated_memory_mb,
        },
        cli_args,
    )
}

/// Create a new index.
fn create_index(manager: &IndexManager, args: &NameArgs, cli_args: &DocIndexArgs) -> Result<()> {
    let handle = manager.create_index(&args.name)?;

    output_result(
        "Index created successfully",
        &IndexCreationResult {
            name: handle.name().to_string(),
            path: handle.directory().display().to_string(),
        },
        cli_args,
    )
}

/// Add text files to an index, replacing earlier copies of the same path.
fn add_documents(manager: &IndexManager, args: &AddArgs, cli_args: &DocIndexArgs) -> Result<()> {
    let start_time = Instant::now();
    let handle = manager.get_index_handle(&args.name)?;

    for file in &args.files {
        let content = fs::read_to_string(file)?;
        let path = file.display().to_string();

        let doc = Document::builder()
            .add_text(PATH_FIELD, path.as_str())
            .add_text(args.field.as_str(), content)
            .build();
        handle.update_document(PATH_FIELD, &path, doc)?;
        info!("indexed {path}");
    }
    handle.commit()?;

    output_result(
        "Documents added successfully",
        &DocumentAdditionResult {
            name: args.name.clone(),
            documents_added: args.files.len(),
            total_documents: handle.doc_count()?,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Search an index.
fn search_index(manager: &IndexManager, args: &SearchArgs, cli_args: &DocIndexArgs) -> Result<()> {
    let start_time = Instant::now();
    let handle = manager.get_index_handle(&args.name)?;

    let hits = handle.search(&args.query, args.field.as_deref(), args.limit)?;

    output_result(
        "Search completed",
        &SearchResults {
            name: args.name.clone(),
            query: args.query.clone(),
            total_hits: hits.len(),
            hits,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Stop tracking an index without touching its files.
fn remove_index(manager: &IndexManager, args: &NameArgs, cli_args: &DocIndexArgs) -> Result<()> {
    let removed = manager.remove_index_tracking(&args.name);

    output_result(
        "Index tracking removed",
        &RemovalResult {
            name: args.name.clone(),
            removed,
            deleted_from_disk: false,
        },
        cli_args,
    )
}

/// Stop tracking an index and delete its files.
fn delete_index(manager: &IndexManager, args: &NameArgs, cli_args: &DocIndexArgs) -> Result<()> {
    let removed = manager.delete_index_completely(&args.name)?;

    output_result(
        "Index deleted",
        &RemovalResult {
            name: args.name.clone(),
            removed,
            deleted_from_disk: !manager.storage_root_path().join(&args.name).exists(),
        },
        cli_args,
    )
}

/// Guess the index built from a source directory.
fn find_index(manager: &IndexManager, args: &FindArgs, cli_args: &DocIndexArgs) -> Result<()> {
    output_result(
        "Index lookup",
        &FindResult {
            directory: args.directory.display().to_string(),
            index: manager.find_index_for_directory(&args.directory),
        },
        cli_args,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn parse(root: &TempDir, rest: &[&str]) -> DocIndexArgs {
        let root = root.path().to_str().unwrap().to_string();
        let mut argv = vec![
            "docindex",
            "--quiet",
            "--format",
            "json",
            "--storage-root",
            root.as_str(),
        ];
        argv.extend_from_slice(rest);
        DocIndexArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_load_config_overrides_storage_root() {
        let root = TempDir::new().unwrap();
        let config = load_config(&parse(&root, &["list"])).unwrap();
        assert_eq!(config.storage_root, root.path());
    }

    #[test]
    fn test_command_sequence() {
        let root = TempDir::new().unwrap();
        let file = root.path().join("notes.txt");
        fs::write(&file, "minutes of the budget meeting").unwrap();
        let file = file.to_str().unwrap().to_string();

        execute_command(parse(&root, &["create", "notes"])).unwrap();
        execute_command(parse(&root, &["add", "notes", &file])).unwrap();
        // Adding the same path again replaces the earlier copy.
        execute_command(parse(&root, &["add", "notes", &file])).unwrap();
        execute_command(parse(&root, &["search", "notes", "budget"])).unwrap();
        execute_command(parse(&root, &["status"])).unwrap();

        let manager = IndexManager::with_storage_root(root.path()).unwrap();
        let handle = manager.get_index_handle("notes").unwrap();
        assert_eq!(handle.doc_count().unwrap(), 1);
        drop(handle);
        drop(manager);

        execute_command(parse(&root, &["remove", "notes"])).unwrap();
        assert!(root.path().join("notes").exists());

        execute_command(parse(&root, &["delete", "notes"])).unwrap();
        assert!(!root.path().join("notes").exists());
    }

    #[test]
    fn test_search_unknown_index_fails() {
        let root = TempDir::new().unwrap();
        assert!(execute_command(parse(&root, &["search", "missing", "x"])).is_err());
    }
}
