use std::sync::{Arc, Barrier};
use std::thread;

use docindex::document::Document;
use docindex::error::ErrorKind;
use docindex::manager::IndexManager;
use tempfile::TempDir;

fn shared_manager(names: &[&str]) -> (TempDir, Arc<IndexManager>) {
    let root = TempDir::new().unwrap();
    {
        let manager = IndexManager::with_storage_root(root.path()).unwrap();
        for name in names {
            manager.create_index(name).unwrap();
        }
    }
    // A fresh manager has everything discovered and nothing loaded.
    let manager = Arc::new(IndexManager::with_storage_root(root.path()).unwrap());
    (root, manager)
}

#[test]
fn test_concurrent_miss_opens_once() {
    let (_root, manager) = shared_manager(&["reports"]);
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                manager.get_index_handle("reports")
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().unwrap())
        .collect();

    // No caller saw a lock conflict, and all share one set of resources.
    assert!(
        results
            .iter()
            .all(|handle| handle.same_resources(&results[0]))
    );
    assert_eq!(manager.loaded_index_names(), vec!["reports"]);
}

#[test]
fn test_concurrent_loads_of_different_indexes() {
    let names = ["alpha", "beta", "gamma", "delta"];
    let (_root, manager) = shared_manager(&names);

    let handles: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let manager = Arc::clone(&manager);
            let name = name.to_string();
            thread::spawn(move || {
                let handle = manager.get_index_handle(&name).unwrap();
                let doc = Document::builder()
                    .add_text("path", format!("/{name}/{i}.txt"))
                    .add_text("content", format!("written by worker {name}"))
                    .build();
                handle.add_document(doc).unwrap();
                handle.commit().unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(manager.loaded_index_names().len(), names.len());
    for name in names {
        let handle = manager.get_index_handle(name).unwrap();
        assert_eq!(handle.search(name, None, 10).unwrap().len(), 1);
    }
}

#[test]
fn test_unload_while_handle_in_use() {
    let (_root, manager) = shared_manager(&["reports"]);
    let handle = manager.get_index_handle("reports").unwrap();

    let unloader = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || manager.unload_index("reports"))
    };
    assert!(unloader.join().unwrap());

    // The stale handle reports the unload instead of touching closed state.
    let err = handle.doc_count().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Closed);

    let fresh = manager.get_index_handle("reports").unwrap();
    assert_eq!(fresh.doc_count().unwrap(), 0);
}

#[test]
fn test_shutdown_from_another_thread() {
    let (root, manager) = shared_manager(&["reports"]);
    let handle = manager.get_index_handle("reports").unwrap();

    let shutdown = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || manager.shutdown())
    };
    shutdown.join().unwrap();

    assert!(manager.is_shut_down());
    assert!(!handle.is_open());

    let reopened = IndexManager::with_storage_root(root.path()).unwrap();
    assert!(reopened.get_index_handle("reports").is_ok());
}

#[test]
fn test_delete_excludes_concurrent_register_and_load() {
    for _ in 0..50 {
        let (root, manager) = shared_manager(&["archive"]);
        manager.get_index_handle("archive").unwrap();
        let barrier = Arc::new(Barrier::new(2));

        let loader = {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                manager.register_index("archive").unwrap();
                manager.get_index_handle("archive").ok()
            })
        };

        barrier.wait();
        manager.delete_index_completely("archive").unwrap();
        let loaded = loader.join().unwrap();

        // A handle that survived the delete belongs to a fresh index whose
        // directory still exists.
        if let Some(handle) = loaded.filter(|handle| handle.is_open()) {
            assert!(manager.index_exists("archive"));
            assert!(root.path().join("archive").is_dir());

            let doc = Document::builder()
                .add_text("path", "/archive/new.txt")
                .add_text("content", "written after delete")
                .build();
            handle.add_document(doc).unwrap();
            handle.commit().unwrap();
        }
    }
}
