use std::path::Path;
use std::sync::Arc;

use docindex::analysis::analyzer::standard::StandardAnalyzer;
use docindex::config::IndexWriterConfig;
use docindex::document::Document;
use docindex::error::ErrorKind;
use docindex::index::writer::IndexWriter;
use docindex::manager::IndexManager;
use docindex::storage::Storage;
use docindex::storage::file::{FileStorage, FileStorageConfig};
use tempfile::TempDir;

const REPORTS: [(&str, &str); 5] = [
    ("/reports/q1.pdf", "First quarter revenue and operating costs"),
    ("/reports/q2.pdf", "Second quarter revenue grew in every region"),
    ("/reports/q3.docx", "Third quarter hiring plan and budget"),
    ("/reports/q4.xlsx", "Fourth quarter forecast"),
    ("/reports/annual.pdf", "Annual summary of revenue, budget and outlook"),
];

fn report(path: &str, content: &str) -> Document {
    Document::builder()
        .add_text("path", path)
        .add_text("content", content)
        .build()
}

/// Write an index the way an ingestion consumer does: open the directory
/// directly, write and commit, then release it.
fn write_index_directly(root: &Path, name: &str, docs: &[(&str, &str)]) {
    let storage = Arc::new(
        FileStorage::open_exclusive(root.join(name), FileStorageConfig::default()).unwrap(),
    );
    let analyzer = Arc::new(StandardAnalyzer::new().unwrap());
    let mut writer =
        IndexWriter::open(storage.clone(), analyzer, IndexWriterConfig::default()).unwrap();

    for (path, content) in docs {
        writer.add_document(report(path, content)).unwrap();
    }
    writer.close().unwrap();
    storage.close().unwrap();
}

#[test]
fn test_register_load_unload_reload() {
    let root = TempDir::new().unwrap();
    let manager = IndexManager::with_storage_root(root.path()).unwrap();
    assert!(manager.list_index_names().is_empty());

    write_index_directly(root.path(), "reports", &REPORTS);
    manager.register_index("reports").unwrap();
    assert_eq!(manager.list_index_names(), vec!["reports"]);

    let handle = manager.get_index_handle("reports").unwrap();
    assert_eq!(handle.doc_count().unwrap(), 5);
    assert!(!handle.search("revenue", None, 10).unwrap().is_empty());

    assert!(manager.unload_index("reports"));
    assert!(!manager.unload_index("reports"));

    let handle = manager.get_index_handle("reports").unwrap();
    assert_eq!(handle.doc_count().unwrap(), 5);
    let hits = handle.search("budget", Some("content"), 10).unwrap();
    let paths: Vec<_> = hits
        .iter()
        .map(|hit| hit.document.get_field("path").unwrap())
        .collect();
    assert_eq!(paths.len(), 2);
    assert!(paths.contains(&"/reports/q3.docx"));
    assert!(paths.contains(&"/reports/annual.pdf"));
}

#[test]
fn test_unload_keeps_uncommitted_writes() {
    let root = TempDir::new().unwrap();
    let manager = IndexManager::with_storage_root(root.path()).unwrap();

    let handle = manager.create_index("notes").unwrap();
    handle
        .add_document(report("/notes/a.txt", "pending minutes"))
        .unwrap();

    // Unloading closes the writer, which commits.
    assert!(manager.unload_index("notes"));

    let handle = manager.get_index_handle("notes").unwrap();
    assert_eq!(handle.search("minutes", None, 10).unwrap().len(), 1);
}

#[test]
fn test_discovery_is_idempotent() {
    let root = TempDir::new().unwrap();
    write_index_directly(root.path(), "reports", &REPORTS);
    write_index_directly(root.path(), "archive", &REPORTS[..1]);
    std::fs::create_dir(root.path().join("empty-dir")).unwrap();

    let first = IndexManager::with_storage_root(root.path()).unwrap();
    let second = IndexManager::with_storage_root(root.path()).unwrap();

    assert_eq!(first.list_index_names(), vec!["archive", "reports"]);
    assert_eq!(first.list_index_names(), second.list_index_names());
    assert_eq!(first.rediscover(), 0);
    assert_eq!(first.list_index_names(), vec!["archive", "reports"]);

    // Discovery never loads anything.
    assert!(first.loaded_index_names().is_empty());
}

#[test]
fn test_rediscover_picks_up_new_indexes() {
    let root = TempDir::new().unwrap();
    let manager = IndexManager::with_storage_root(root.path()).unwrap();

    write_index_directly(root.path(), "late", &REPORTS[..2]);
    assert!(!manager.index_exists("late"));

    assert_eq!(manager.rediscover(), 1);
    assert!(manager.index_exists("late"));
}

#[test]
fn test_unknown_index_is_not_found() {
    let root = TempDir::new().unwrap();
    let manager = IndexManager::with_storage_root(root.path()).unwrap();

    let err = manager.get_index_handle("nonexistent").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("nonexistent"));

    // Nothing was created on disk.
    assert!(!root.path().join("nonexistent").exists());
    assert!(!manager.index_exists("nonexistent"));
}

#[test]
fn test_remove_tracking_keeps_files() {
    let root = TempDir::new().unwrap();
    let manager = IndexManager::with_storage_root(root.path()).unwrap();
    manager.create_index("reports").unwrap();

    assert!(manager.remove_index_tracking("reports"));
    assert!(!manager.remove_index_tracking("reports"));

    assert!(!manager.index_exists("reports"));
    assert!(manager.loaded_index_names().is_empty());
    assert!(root.path().join("reports").join("segments_1").exists());
    // The write lock was released on unload.
    let other = IndexManager::with_storage_root(root.path()).unwrap();
    assert!(other.get_index_handle("reports").is_ok());
    other.shutdown();

    // The index can be picked up again.
    assert_eq!(manager.rediscover(), 1);
    assert!(manager.get_index_handle("reports").is_ok());
}

#[test]
fn test_delete_completely_removes_files() {
    let root = TempDir::new().unwrap();
    let manager = IndexManager::with_storage_root(root.path()).unwrap();

    let handle = manager.create_index("archive").unwrap();
    handle.add_document(report("/a.pdf", "old")).unwrap();

    assert!(manager.delete_index_completely("archive").unwrap());
    assert!(!manager.index_exists("archive"));
    assert!(!root.path().join("archive").exists());
    assert!(!handle.is_open());

    // Deleting again is harmless.
    assert!(!manager.delete_index_completely("archive").unwrap());

    let err = manager.delete_index_completely("../outside").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidName);
}

#[test]
fn test_unload_all_is_best_effort() {
    let root = TempDir::new().unwrap();
    let manager = IndexManager::with_storage_root(root.path()).unwrap();

    for name in ["alpha", "beta", "gamma"] {
        let handle = manager.create_index(name).unwrap();
        handle
            .add_document(report(&format!("/{name}/a.txt"), "pending"))
            .unwrap();
    }

    // Make one index fail its final commit on close.
    std::fs::remove_dir_all(root.path().join("beta")).unwrap();

    assert_eq!(manager.unload_all_indexes(), 2);
    assert!(manager.loaded_index_names().is_empty());
    assert_eq!(manager.list_index_names(), vec!["alpha", "beta", "gamma"]);

    // The others were committed on close.
    for name in ["alpha", "gamma"] {
        let handle = manager.get_index_handle(name).unwrap();
        assert_eq!(handle.doc_count().unwrap(), 1);
    }
    assert_eq!(manager.unload_all_indexes(), 2);
}

#[test]
fn test_memory_status_consistency() {
    let root = TempDir::new().unwrap();
    write_index_directly(root.path(), "reports", &REPORTS);
    write_index_directly(root.path(), "archive", &REPORTS[..1]);

    let manager = IndexManager::with_storage_root(root.path()).unwrap();
    manager.get_index_handle("reports").unwrap();

    let status = manager.get_index_memory_status();
    assert_eq!(status.len(), 2);

    let reports = status["reports"];
    assert!(reports.discovered);
    assert!(reports.loaded);
    assert!(reports.estimated_memory_mb > 0.0);

    let archive = status["archive"];
    assert!(archive.discovered);
    assert!(!archive.loaded);
    assert_eq!(archive.estimated_memory_mb, 0.0);
}

#[test]
fn test_memory_status_falls_back_when_directory_vanishes() {
    let root = TempDir::new().unwrap();
    let manager = IndexManager::with_storage_root(root.path()).unwrap();
    manager.create_index("reports").unwrap();

    std::fs::remove_dir_all(root.path().join("reports")).unwrap();

    let status = manager.get_index_memory_status();
    assert!(status["reports"].loaded);
    assert_eq!(status["reports"].estimated_memory_mb, 50.0);
}

#[test]
fn test_lock_conflict_between_managers() {
    let root = TempDir::new().unwrap();
    write_index_directly(root.path(), "shared", &REPORTS);

    let first = IndexManager::with_storage_root(root.path()).unwrap();
    let second = IndexManager::with_storage_root(root.path()).unwrap();

    let _handle = first.get_index_handle("shared").unwrap();

    let err = second.get_index_handle("shared").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LockConflict);
    assert!(second.loaded_index_names().is_empty());

    first.unload_index("shared");
    assert!(second.get_index_handle("shared").is_ok());
}

#[test]
fn test_restart_after_crash_reopens_index() {
    let root = TempDir::new().unwrap();
    write_index_directly(root.path(), "crashed", &REPORTS[..1]);
    // A process killed while holding the index leaves its lock file behind.
    std::fs::write(root.path().join("crashed").join("write.lock"), b"").unwrap();

    let manager = IndexManager::with_storage_root(root.path()).unwrap();
    assert!(manager.index_exists("crashed"));

    let handle = manager.get_index_handle("crashed").unwrap();
    assert_eq!(handle.doc_count().unwrap(), 1);
}

#[test]
fn test_invalid_directory_names_are_skipped() {
    let root = TempDir::new().unwrap();
    write_index_directly(root.path(), "valid", &REPORTS[..1]);
    write_index_directly(root.path(), "bad\u{1}name", &REPORTS[..1]);

    let manager = IndexManager::with_storage_root(root.path()).unwrap();
    assert_eq!(manager.list_index_names(), vec!["valid"]);
}

#[test]
fn test_shutdown_releases_every_index() {
    let root = TempDir::new().unwrap();
    // Dropping the manager shuts it down.
    let handles = {
        let manager = IndexManager::with_storage_root(root.path()).unwrap();
        let handles: Vec<_> = ["one", "two"]
            .iter()
            .map(|name| manager.create_index(name).unwrap())
            .collect();
        handles[0].add_document(report("/x.txt", "flushed on drop")).unwrap();
        handles
    };

    assert!(handles.iter().all(|handle| !handle.is_open()));

    let manager = IndexManager::with_storage_root(root.path()).unwrap();
    let handle = manager.get_index_handle("one").unwrap();
    assert_eq!(handle.search("flushed", None, 10).unwrap().len(), 1);
    assert!(manager.get_index_handle("two").is_ok());
}

#[test]
fn test_storage_root_accessor() {
    let root = TempDir::new().unwrap();
    let manager = IndexManager::with_storage_root(root.path()).unwrap();
    assert_eq!(manager.storage_root_path(), root.path());
}
