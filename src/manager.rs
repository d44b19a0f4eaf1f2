//! Index lifecycle management.
//!
//! The [`IndexManager`] knows which indexes exist under its storage root
//! (the [`Catalog`]) and which of them are loaded. Indexes are opened
//! lazily on first use and stay loaded until they are explicitly unloaded,
//! removed, or the manager shuts down.
//!
//! ```text
//! [Unknown] --discovery / register_index--> [Discovered, Unloaded]
//! [Discovered, Unloaded] --get_index_handle--> [Discovered, Loaded]
//! [Discovered, Loaded] --unload_index--> [Discovered, Unloaded]
//! [Discovered, *] --remove_index_tracking--> [Unknown]   (files kept)
//! [Discovered, *] --delete_index_completely--> [Unknown] (files removed)
//! ```
//!
//! # Example
//!
//! ```
//! use docindex::document::Document;
//! use docindex::manager::IndexManager;
//!
//! # fn main() -> docindex::error::Result<()> {
//! let root = tempfile::TempDir::new()?;
//! let manager = IndexManager::with_storage_root(root.path())?;
//!
//! let handle = manager.create_index("reports")?;
//! handle.add_document(Document::builder().add_text("content", "quarterly revenue").build())?;
//! handle.commit()?;
//!
//! assert!(manager.unload_index("reports"));
//!
//! let handle = manager.get_index_handle("reports")?;
//! assert_eq!(handle.search("revenue", None, 10)?.len(), 1);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use ahash::AHashMap;
use log::{debug, error, info, warn};
use parking_lot::RwLock;

use crate::config::IndexManagerConfig;
use crate::error::{DocIndexError, Result};

pub mod catalog;
pub mod handle;
pub mod status;

pub use catalog::{Catalog, IndexName};
pub use handle::IndexHandle;
pub use status::IndexMemoryStatus;

use catalog::{has_commit_marker, scan_storage_root};
use handle::IndexResources;
use status::estimate_memory_mb;

/// Catalog and loaded handles, guarded together.
#[derive(Debug, Default)]
struct ManagerState {
    catalog: Catalog,
    loaded: AHashMap<String, IndexHandle>,
}

impl ManagerState {
    /// Unload `name` if loaded and drop it from the catalog.
    fn untrack(&mut self, name: &str) -> bool {
        if let Some(handle) = self.loaded.remove(name) {
            close_handle(name, &handle);
        }
        self.catalog.remove(name)
    }
}

/// Owner of every index under one storage root.
///
/// All methods take `&self`; the manager is meant to be shared between
/// threads behind an `Arc`.
#[derive(Debug)]
pub struct IndexManager {
    config: IndexManagerConfig,
    state: RwLock<ManagerState>,
    shut_down: AtomicBool,
}

impl IndexManager {
    /// Create a manager and discover the indexes under its storage root.
    ///
    /// The storage root is created if missing. A root that cannot be
    /// listed leaves the catalog empty instead of failing.
    pub fn new(config: IndexManagerConfig) -> Result<Self> {
        config.validate()?;

        if let Err(e) = std::fs::create_dir_all(&config.storage_root) {
            warn!(
                "cannot create storage root {}: {e}",
                config.storage_root.display()
            );
        }

        let manager = IndexManager {
            config,
            state: RwLock::new(ManagerState::default()),
            shut_down: AtomicBool::new(false),
        };

        let found = manager.discover_indexes();
        manager.state.write().catalog.extend(found);

        info!(
            "index manager ready at {} ({} indexes)",
            manager.config.storage_root.display(),
            manager.state.read().catalog.len()
        );
        Ok(manager)
    }

    /// Create a manager with default settings rooted at `storage_root`.
    pub fn with_storage_root<P: Into<PathBuf>>(storage_root: P) -> Result<Self> {
        Self::new(IndexManagerConfig::new(storage_root))
    }

    fn discover_indexes(&self) -> Vec<IndexName> {
        match scan_storage_root(&self.config.storage_root) {
            Ok(found) => found,
            Err(e) => {
                warn!("{e}; continuing with an empty catalog");
                Vec::new()
            }
        }
    }

    /// Scan the storage root again and catalogue any new indexes.
    ///
    /// Existing entries are kept. Returns the number of names added.
    pub fn rediscover(&self) -> usize {
        let mut state = self.state.write();
        let found = self.discover_indexes();
        let added = found
            .into_iter()
            .filter(|name| state.catalog.insert(name.clone()))
            .count();

        if added > 0 {
            info!("discovered {added} new indexes");
        }
        added
    }

    /// Whether `name` is in the catalog.
    pub fn index_exists(&self, name: &str) -> bool {
        self.state.read().catalog.contains(name)
    }

    /// All catalogued names, sorted.
    pub fn list_index_names(&self) -> Vec<String> {
        self.state.read().catalog.names()
    }

    /// Names of the currently loaded indexes, sorted.
    pub fn loaded_index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().loaded.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get a handle to a catalogued index, loading it if needed.
    ///
    /// Loading opens the index directory exclusively. Concurrent callers
    /// asking for the same index all receive handles to the same resources.
    ///
    /// # Errors
    ///
    /// [`DocIndexError::NotFound`] if `name` is not catalogued, and
    /// [`DocIndexError::LockConflict`] if the index directory is locked by
    /// another opener.
    pub fn get_index_handle(&self, name: &str) -> Result<IndexHandle> {
        {
            let state = self.state.read();
            if let Some(handle) = state.loaded.get(name) {
                debug!("index {name} already loaded");
                return Ok(handle.clone());
            }
            if !state.catalog.contains(name) {
                return Err(DocIndexError::not_found(name));
            }
        }

        // Hold the write lock across open-and-insert so a racing caller
        // cannot open the same directory twice.
        let mut state = self.state.write();
        if let Some(handle) = state.loaded.get(name) {
            debug!("index {name} loaded by a concurrent caller");
            return Ok(handle.clone());
        }
        if !state.catalog.contains(name) {
            return Err(DocIndexError::not_found(name));
        }

        let resources = IndexResources::open(name, self.index_path(name), &self.config)?;
        let handle = IndexHandle::new(resources);
        state.loaded.insert(name.to_string(), handle.clone());

        info!("loaded index {name}");
        Ok(handle)
    }

    /// Create a new empty index and load it.
    ///
    /// The index is committed once so it is discoverable on disk, then
    /// catalogued.
    ///
    /// # Errors
    ///
    /// [`DocIndexError::AlreadyExists`] when `name` is catalogued or its
    /// directory already holds an index.
    pub fn create_index(&self, name: &str) -> Result<IndexHandle> {
        let name = IndexName::new(name)?;
        let directory = self.index_path(name.as_str());

        let mut state = self.state.write();
        if state.catalog.contains(name.as_str())
            || has_commit_marker(&directory).unwrap_or(false)
        {
            return Err(DocIndexError::AlreadyExists(name.into_string()));
        }

        let handle = IndexHandle::new(IndexResources::open(
            name.as_str(),
            directory,
            &self.config,
        )?);
        if let Err(e) = handle.commit() {
            let _ = handle.close();
            return Err(e);
        }

        state.loaded.insert(name.to_string(), handle.clone());
        state.catalog.insert(name.clone());

        info!("created index {name}");
        Ok(handle)
    }

    /// Add `name` to the catalog after its first write-out.
    ///
    /// Returns `true` if the name was not catalogued before.
    pub fn register_index(&self, name: &str) -> Result<bool> {
        let name = IndexName::new(name)?;
        let added = self.state.write().catalog.insert(name.clone());
        if added {
            info!("registered index {name}");
        }
        Ok(added)
    }

    /// Unload `name`, keeping it in the catalog.
    ///
    /// Returns `false` when the index was not loaded. A failure while
    /// closing is logged and the index is unloaded regardless.
    pub fn unload_index(&self, name: &str) -> bool {
        let mut state = self.state.write();
        match state.loaded.remove(name) {
            Some(handle) => {
                close_handle(name, &handle);
                true
            }
            None => false,
        }
    }

    /// Unload every loaded index.
    ///
    /// Returns how many closed cleanly. Indexes that fail to close are still
    /// unloaded.
    pub fn unload_all_indexes(&self) -> usize {
        let mut state = self.state.write();
        let mut loaded: Vec<(String, IndexHandle)> = state.loaded.drain().collect();
        loaded.sort_by(|a, b| a.0.cmp(&b.0));

        let total = loaded.len();
        let closed = loaded
            .iter()
            .filter(|(name, handle)| close_handle(name, handle))
            .count();

        info!("unloaded {closed} of {total} indexes");
        closed
    }

    /// Memory residency for every catalogued index.
    pub fn get_index_memory_status(&self) -> BTreeMap<String, IndexMemoryStatus> {
        let state = self.state.read();
        state
            .catalog
            .iter()
            .map(|name| {
                let loaded = state.loaded.contains_key(name.as_str());
                let status = IndexMemoryStatus {
                    discovered: true,
                    loaded,
                    estimated_memory_mb: estimate_memory_mb(
                        &self.index_path(name.as_str()),
                        loaded,
                        self.config.default_memory_estimate_mb,
                    ),
                };
                (name.to_string(), status)
            })
            .collect()
    }

    /// Unload `name` if loaded and drop it from the catalog.
    ///
    /// Files on disk are left alone. Returns whether the name was catalogued.
    pub fn remove_index_tracking(&self, name: &str) -> bool {
        let removed = self.state.write().untrack(name);
        if removed {
            info!("stopped tracking index {name}");
        }
        removed
    }

    /// Stop tracking `name` and delete its directory.
    ///
    /// # Errors
    ///
    /// [`DocIndexError::DeletionFailed`] when the directory cannot be
    /// removed. The catalog entry is already gone at that point.
    pub fn delete_index_completely(&self, name: &str) -> Result<bool> {
        let name = IndexName::new(name)?;

        // No register or load of this name may run until the files are gone.
        let mut state = self.state.write();
        let removed = state.untrack(name.as_str());
        if removed {
            info!("stopped tracking index {name}");
        }

        let directory = self.index_path(name.as_str());
        if directory.exists() {
            std::fs::remove_dir_all(&directory).map_err(|e| {
                error!("failed to delete {}: {e}", directory.display());
                DocIndexError::deletion_failed(name.as_str(), e)
            })?;
            info!("deleted index {name} from disk");
        }
        Ok(removed)
    }

    /// The directory holding every index.
    pub fn storage_root_path(&self) -> &Path {
        &self.config.storage_root
    }

    /// Best-effort guess at the index built from `source_directory`.
    ///
    /// Returns the first catalogued name, in sorted order, containing the
    /// last segment of `source_directory` (case-insensitive). No mapping
    /// from index to source directory is stored, so this is a heuristic.
    pub fn find_index_for_directory<P: AsRef<Path>>(&self, source_directory: P) -> Option<String> {
        let segment = source_directory
            .as_ref()
            .file_name()?
            .to_string_lossy()
            .to_lowercase();
        if segment.is_empty() {
            return None;
        }

        self.state
            .read()
            .catalog
            .iter()
            .find(|name| name.as_str().to_lowercase().contains(&segment))
            .map(|name| name.to_string())
    }

    /// Close every loaded index and clear all bookkeeping.
    ///
    /// Only the first call does anything.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut state = self.state.write();
        let loaded: Vec<(String, IndexHandle)> = state.loaded.drain().collect();
        for (name, handle) in &loaded {
            close_handle(name, handle);
        }
        state.catalog.clear();

        info!("index manager shut down ({} indexes closed)", loaded.len());
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &IndexManagerConfig {
        &self.config
    }

    fn index_path(&self, name: &str) -> PathBuf {
        self.config.storage_root.join(name)
    }
}

impl Drop for IndexManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Close `handle`, logging failures. Returns whether it closed cleanly.
fn close_handle(name: &str, handle: &IndexHandle) -> bool {
    match handle.close() {
        Ok(()) => {
            info!("unloaded index {name}");
            true
        }
        Err(e) => {
            warn!("unloading index {name}: {e}");
            false
        }
    }
}
