//! # docindex
//!
//! Lifecycle management for on-disk full-text document indexes.
//!
//! ## Features
//!
//! - Discovery of indexes under a storage root
//! - Lazy loading with one set of open resources per index
//! - Explicit unload, unload-all and shutdown with ordered teardown
//! - Memory residency reporting
//! - Lock-file based exclusive access to index directories
//! - A small segment-based index with term-frequency scoring

pub mod analysis;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod manager;
pub mod storage;

pub mod prelude {
    pub use crate::config::IndexManagerConfig;
    pub use crate::document::Document;
    pub use crate::error::{DocIndexError, ErrorKind, Result};
    pub use crate::index::search::SearchHit;
    pub use crate::manager::{IndexHandle, IndexManager, IndexMemoryStatus};
}

pub use config::IndexManagerConfig;
pub use error::{DocIndexError, Result};
pub use manager::{IndexHandle, IndexManager};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
