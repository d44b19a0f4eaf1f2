//! Storage abstraction for index directories.
//!
//! Every index lives in its own directory under the storage root. The
//! [`Storage`] trait is the binding the index writer uses to read and write
//! the files inside that directory, and [`file::FileStorage`] is the
//! filesystem implementation used by the index manager.
//!
//! An exclusively opened storage holds an OS lock on its `write.lock` file
//! for as long as it is open. A second opener, in this process or another,
//! fails with [`DocIndexError::LockConflict`]. The lock is released when its
//! holder exits, even without a clean close, and the file itself is left in
//! place.
//!
//! # Example
//!
//! ```
//! use docindex::storage::Storage;
//! use docindex::storage::file::{FileStorage, FileStorageConfig};
//! use std::io::{Read, Write};
//!
//! # fn main() -> docindex::error::Result<()> {
//! let dir = tempfile::TempDir::new()?;
//! let storage = FileStorage::open(dir.path(), FileStorageConfig::default())?;
//!
//! let mut output = storage.create_output("segments_1")?;
//! output.write_all(b"{}")?;
//! output.close()?;
//!
//! let mut input = storage.open_input("segments_1")?;
//! let mut buffer = Vec::new();
//! input.read_to_end(&mut buffer)?;
//! assert_eq!(buffer, b"{}");
//! # Ok(())
//! # }
//! ```

use std::io::{Read, Write};

use crate::error::DocIndexError;
use crate::error::Result;

pub mod file;

/// Name of the lock file guarding an exclusively opened index directory.
pub const WRITE_LOCK_NAME: &str = "write";

/// A trait for storage backends that hold the files of one index.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Open an existing file for reading.
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    /// Create a file for writing, truncating any existing content.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Check if a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Delete a file. Deleting a missing file is not an error.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// List all file names in the storage, sorted.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Get the size of a file in bytes.
    fn file_size(&self, name: &str) -> Result<u64>;

    /// Atomically rename a file.
    ///
    /// Used for atomic replacement: write to a temporary file, then rename
    /// it so readers never observe partial data.
    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()>;

    /// Create a uniquely named temporary file starting with `prefix`.
    fn create_temp_output(&self, prefix: &str) -> Result<(String, Box<dyn StorageOutput>)>;

    /// Sync all pending writes to storage.
    fn sync(&self) -> Result<()>;

    /// Close the storage and release every lock it holds.
    ///
    /// Closing is idempotent. Once closed, every other operation fails with
    /// [`StorageError::StorageClosed`].
    fn close(&self) -> Result<()>;

    /// Whether [`close`](Self::close) has been called.
    fn is_closed(&self) -> bool;
}

/// A trait for reading data from storage.
pub trait StorageInput: Read + Send + std::fmt::Debug {
    /// Get the size of the input stream.
    fn size(&self) -> Result<u64>;
}

/// A trait for writing data to storage.
pub trait StorageOutput: Write + Send + std::fmt::Debug {
    /// Flush and sync the output to storage.
    fn flush_and_sync(&mut self) -> Result<()>;

    /// Get the number of bytes written so far.
    fn position(&self) -> u64;

    /// Close the output stream, syncing its content.
    fn close(&mut self) -> Result<()>;
}

/// A lock manager for coordinating exclusive access to storage.
pub trait LockManager: Send + Sync + std::fmt::Debug {
    /// Acquire a lock with the given name, failing if it is already held.
    fn acquire_lock(&self, name: &str) -> Result<()>;

    /// Check if this manager holds a lock with the given name.
    fn lock_exists(&self, name: &str) -> bool;

    /// Release all held locks.
    ///
    /// Every lock is attempted even if an earlier one fails; the first
    /// failure is returned.
    fn release_all(&self) -> Result<()>;
}

/// Error types specific to storage operations.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// File not found.
    FileNotFound(String),

    /// I/O error.
    IoError(String),

    /// Lock acquisition failed.
    LockFailed(String),

    /// Lock release failed.
    UnlockFailed(String),

    /// Storage is closed.
    StorageClosed,
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::FileNotFound(name) => write!(f, "File not found: {name}"),
            StorageError::IoError(msg) => write!(f, "I/O error: {msg}"),
            StorageError::LockFailed(name) => write!(f, "Failed to acquire lock: {name}"),
            StorageError::UnlockFailed(msg) => write!(f, "Failed to release lock: {msg}"),
            StorageError::StorageClosed => write!(f, "Storage is closed"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for DocIndexError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::LockFailed(name) => DocIndexError::lock_conflict(name),
            other => DocIndexError::storage(other.to_string()),
        }
    }
}

/// Read a whole file from storage into memory.
pub fn read_all(storage: &dyn Storage, name: &str) -> Result<Vec<u8>> {
    let mut input = storage.open_input(name)?;
    let mut buffer = Vec::with_capacity(input.size()? as usize);
    input.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Write `data` to a temporary file and rename it to `name`.
pub fn write_atomic(storage: &dyn Storage, name: &str, data: &[u8]) -> Result<()> {
    let (temp_name, mut output) = storage.create_temp_output(&format!("pending_{name}"))?;
    output.write_all(data)?;
    output.close()?;
    storage.rename_file(&temp_name, name)
}
