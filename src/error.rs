//! Error types for the docindex library.
//!
//! All fallible operations return [`DocIndexError`] through the crate-wide
//! [`Result`] alias. The variants mirror the lifecycle failures an index can
//! go through (not found, locked by someone else, failed to close, failed to
//! delete) plus the lower level storage, analysis and serialization errors.
//!
//! # Examples
//!
//! ```
//! use docindex::error::{DocIndexError, ErrorKind, Result};
//!
//! fn lookup(name: &str) -> Result<()> {
//!     Err(DocIndexError::not_found(name))
//! }
//!
//! let err = lookup("reports").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::NotFound);
//! assert_eq!(err.to_string(), "Index not found: reports");
//! ```

use std::io;

use thiserror::Error;

/// The main error type for docindex operations.
#[derive(Error, Debug)]
pub enum DocIndexError {
    /// I/O errors (file operations, directory listing, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The named index is not in the catalog.
    #[error("Index not found: {0}")]
    NotFound(String),

    /// The index storage is exclusively held by another opener.
    #[error("Index is locked by another writer: {0}")]
    LockConflict(String),

    /// The storage root could not be scanned.
    #[error("Index discovery failed: {0}")]
    DiscoveryFailure(String),

    /// Closing a writer, analyzer or directory binding failed.
    #[error("Failed to close index resources: {0}")]
    CloseFailure(String),

    /// Removing an index directory from disk failed.
    #[error("Failed to delete index '{name}' from disk: {source}")]
    DeletionFailed {
        name: String,
        #[source]
        source: io::Error,
    },

    /// The index name cannot be used as a directory name.
    #[error("Invalid index name '{name}': {reason}")]
    InvalidIndexName { name: String, reason: String },

    /// An index with this name already exists.
    #[error("Index already exists: {0}")]
    AlreadyExists(String),

    /// A handle was used after its index was unloaded.
    #[error("Index has been unloaded: {0}")]
    IndexClosed(String),

    /// Index-format errors (corrupt segments, bad commit points)
    #[error("Index error: {0}")]
    Index(String),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with DocIndexError.
pub type Result<T> = std::result::Result<T, DocIndexError>;

/// Coarse classification of a [`DocIndexError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    LockConflict,
    DiscoveryFailure,
    CloseFailure,
    DeletionFailed,
    InvalidName,
    AlreadyExists,
    Closed,
    Io,
    Index,
    Analysis,
    Storage,
    Config,
    Serialization,
    Other,
}

impl DocIndexError {
    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(name: S) -> Self {
        DocIndexError::NotFound(name.into())
    }

    /// Create a new lock conflict error.
    pub fn lock_conflict<S: Into<String>>(name: S) -> Self {
        DocIndexError::LockConflict(name.into())
    }

    /// Create a new close failure error.
    pub fn close_failure<S: Into<String>>(msg: S) -> Self {
        DocIndexError::CloseFailure(msg.into())
    }

    /// Create a new deletion failure error.
    pub fn deletion_failed<S: Into<String>>(name: S, source: io::Error) -> Self {
        DocIndexError::DeletionFailed {
            name: name.into(),
            source,
        }
    }

    /// Create a new invalid index name error.
    pub fn invalid_name<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        DocIndexError::InvalidIndexName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        DocIndexError::Index(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        DocIndexError::Analysis(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        DocIndexError::Storage(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        DocIndexError::Config(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        DocIndexError::Other(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocIndexError::NotFound(_) => ErrorKind::NotFound,
            DocIndexError::LockConflict(_) => ErrorKind::LockConflict,
            DocIndexError::DiscoveryFailure(_) => ErrorKind::DiscoveryFailure,
            DocIndexError::CloseFailure(_) => ErrorKind::CloseFailure,
            DocIndexError::DeletionFailed { .. } => ErrorKind::DeletionFailed,
            DocIndexError::InvalidIndexName { .. } => ErrorKind::InvalidName,
            DocIndexError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            DocIndexError::IndexClosed(_) => ErrorKind::Closed,
            DocIndexError::Io(_) => ErrorKind::Io,
            DocIndexError::Index(_) => ErrorKind::Index,
            DocIndexError::Analysis(_) => ErrorKind::Analysis,
            DocIndexError::Storage(_) => ErrorKind::Storage,
            DocIndexError::Config(_) => ErrorKind::Config,
            DocIndexError::Json(_) | DocIndexError::Serialization(_) => ErrorKind::Serialization,
            DocIndexError::Other(_) => ErrorKind::Other,
        }
    }
}
