//! Loaded index resources and the handles callers use to reach them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::analysis::analyzer::Analyzer;
use crate::config::IndexManagerConfig;
use crate::document::Document;
use crate::error::{DocIndexError, Result};
use crate::index::search::SearchHit;
use crate::index::writer::IndexWriter;
use crate::storage::Storage;
use crate::storage::file::FileStorage;

/// The open state of one index: an exclusive storage binding, the writer
/// bound to it and the analyzer bound to the writer.
///
/// Owned by the index manager. Handles share it, but only the manager
/// closes it.
pub(crate) struct IndexResources {
    name: String,
    directory: PathBuf,
    storage: Arc<FileStorage>,
    writer: Mutex<Option<IndexWriter>>,
    analyzer: Mutex<Option<Arc<dyn Analyzer>>>,
    open: AtomicBool,
}

impl std::fmt::Debug for IndexResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexResources")
            .field("name", &self.name)
            .field("directory", &self.directory)
            .field("open", &self.open.load(Ordering::Acquire))
            .finish()
    }
}

impl IndexResources {
    /// Open the index stored in `directory`.
    ///
    /// Fails with [`DocIndexError::LockConflict`] when another opener holds
    /// the directory's write lock. Nothing stays locked on failure.
    pub(crate) fn open(name: &str, directory: PathBuf, config: &IndexManagerConfig) -> Result<Self> {
        let analyzer = config.analyzer.build()?;

        let storage =
            FileStorage::open_exclusive(&directory, config.storage.clone()).map_err(|e| match e {
                DocIndexError::LockConflict(_) => DocIndexError::lock_conflict(name),
                other => other,
            })?;
        let storage = Arc::new(storage);

        let writer = match IndexWriter::open(storage.clone(), analyzer.clone(), config.writer.clone())
        {
            Ok(writer) => writer,
            Err(e) => {
                let _ = storage.close();
                return Err(e);
            }
        };

        Ok(IndexResources {
            name: name.to_string(),
            directory,
            storage,
            writer: Mutex::new(Some(writer)),
            analyzer: Mutex::new(Some(analyzer)),
            open: AtomicBool::new(true),
        })
    }

    /// Close writer, analyzer and storage, in that order.
    ///
    /// Every step runs even if an earlier one fails; the failures are
    /// reported together. Closing twice is a no-op.
    pub(crate) fn close(&self) -> Result<()> {
        if !self.open.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        let mut failures = Vec::new();

        if let Some(mut writer) = self.writer.lock().take() {
            if let Err(e) = writer.close() {
                failures.push(format!("writer: {e}"));
            }
        }

        drop(self.analyzer.lock().take());

        if let Err(e) = self.storage.close() {
            failures.push(format!("storage: {e}"));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DocIndexError::close_failure(format!(
                "{}: {}",
                self.name,
                failures.join("; ")
            )))
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn with_writer<T>(&self, f: impl FnOnce(&mut IndexWriter) -> Result<T>) -> Result<T> {
        match self.writer.lock().as_mut() {
            Some(writer) => f(writer),
            None => Err(DocIndexError::IndexClosed(self.name.clone())),
        }
    }
}

impl Drop for IndexResources {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// A handle to a loaded index.
///
/// Handles are cheap to clone and all clones share the same resources.
/// The manager owns those resources: once it unloads the index, every
/// call on an outstanding handle fails with [`DocIndexError::IndexClosed`]
/// and a fresh handle must be obtained from the manager.
#[derive(Debug, Clone)]
pub struct IndexHandle {
    resources: Arc<IndexResources>,
}

impl IndexHandle {
    pub(crate) fn new(resources: IndexResources) -> Self {
        IndexHandle {
            resources: Arc::new(resources),
        }
    }

    pub(crate) fn close(&self) -> Result<()> {
        self.resources.close()
    }

    /// Name of the index.
    pub fn name(&self) -> &str {
        &self.resources.name
    }

    /// Directory the index is stored in.
    pub fn directory(&self) -> &Path {
        &self.resources.directory
    }

    /// Whether the manager still has this index loaded.
    pub fn is_open(&self) -> bool {
        self.resources.is_open()
    }

    /// Whether both handles refer to the same loaded resources.
    pub fn same_resources(&self, other: &IndexHandle) -> bool {
        Arc::ptr_eq(&self.resources, &other.resources)
    }

    /// Add a document, returning its id.
    pub fn add_document(&self, doc: Document) -> Result<u64> {
        self.resources.with_writer(|writer| writer.add_document(doc))
    }

    /// Replace the documents whose `field` equals `value` with `doc`.
    pub fn update_document(&self, field: &str, value: &str, doc: Document) -> Result<u64> {
        self.resources
            .with_writer(|writer| writer.update_document(field, value, doc))
    }

    /// Delete every document whose `field` equals `value`.
    pub fn delete_documents(&self, field: &str, value: &str) -> Result<u64> {
        self.resources
            .with_writer(|writer| writer.delete_documents(field, value))
    }

    /// Make pending changes durable.
    pub fn commit(&self) -> Result<()> {
        self.resources.with_writer(IndexWriter::commit)
    }

    /// Discard changes made since the last commit.
    pub fn rollback(&self) -> Result<()> {
        self.resources.with_writer(IndexWriter::rollback)
    }

    /// Search the index. See [`IndexWriter::search`].
    pub fn search(&self, query: &str, field: Option<&str>, limit: usize) -> Result<Vec<SearchHit>> {
        self.resources
            .with_writer(|writer| writer.search(query, field, limit))
    }

    /// Number of live documents.
    pub fn doc_count(&self) -> Result<u64> {
        self.resources.with_writer(|writer| Ok(writer.doc_count()))
    }

    /// Name of the analyzer bound to the index.
    pub fn analyzer_name(&self) -> Result<String> {
        match self.resources.analyzer.lock().as_ref() {
            Some(analyzer) => Ok(analyzer.name().to_string()),
            None => Err(DocIndexError::IndexClosed(self.resources.name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_handle(root: &TempDir, name: &str) -> Result<IndexHandle> {
        let config = IndexManagerConfig::new(root.path());
        IndexResources::open(name, root.path().join(name), &config).map(IndexHandle::new)
    }

    #[test]
    fn test_open_takes_write_lock() {
        let root = TempDir::new().unwrap();
        let handle = open_handle(&root, "reports").unwrap();

        assert!(root.path().join("reports").join("write.lock").exists());

        let err = open_handle(&root, "reports").unwrap_err();
        assert!(matches!(err, DocIndexError::LockConflict(name) if name == "reports"));

        handle.close().unwrap();
        assert!(!handle.resources.storage.holds_write_lock());
        assert!(open_handle(&root, "reports").is_ok());
    }

    #[test]
    fn test_closed_handle_rejects_calls() {
        let root = TempDir::new().unwrap();
        let handle = open_handle(&root, "reports").unwrap();
        let clone = handle.clone();

        handle
            .add_document(Document::builder().add_text("content", "draft").build())
            .unwrap();
        assert_eq!(clone.analyzer_name().unwrap(), "standard");

        handle.close().unwrap();
        assert!(!clone.is_open());
        assert!(handle.close().is_ok());

        let err = clone.search("draft", None, 10).unwrap_err();
        assert!(matches!(err, DocIndexError::IndexClosed(_)));
        assert!(clone.analyzer_name().is_err());
        assert!(clone.doc_count().is_err());

        // Closing flushed the pending document.
        let reopened = open_handle(&root, "reports").unwrap();
        assert_eq!(reopened.doc_count().unwrap(), 1);
    }

    #[test]
    fn test_close_continues_after_writer_failure() {
        let root = TempDir::new().unwrap();
        let handle = open_handle(&root, "reports").unwrap();
        handle
            .add_document(Document::builder().add_text("content", "unsaved").build())
            .unwrap();

        // The final commit cannot write its segment.
        std::fs::remove_dir_all(root.path().join("reports")).unwrap();

        let err = handle.close().unwrap_err();
        assert!(matches!(err, DocIndexError::CloseFailure(ref msg) if msg.contains("writer")));
        assert!(!handle.is_open());

        // The storage was still closed and its lock released.
        assert!(handle.resources.storage.is_closed());
        assert!(!handle.resources.storage.holds_write_lock());
    }
}
