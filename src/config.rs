//! Configuration for the index manager and the writers it opens.
//!
//! Configuration is plain serde data so it can be loaded from a JSON file:
//!
//! ```json
//! {
//!   "storage_root": "/var/lib/docindex",
//!   "default_memory_estimate_mb": 50.0,
//!   "analyzer": "standard",
//!   "writer": { "max_buffered_docs": 1000, "segment_prefix": "segment" }
//! }
//! ```
//!
//! Every field is optional in the file; missing fields take their defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::standard::StandardAnalyzer;
use crate::error::{DocIndexError, Result};
use crate::storage::file::FileStorageConfig;

/// Application directory created under the user's local data directory.
pub const DEFAULT_APP_DIR: &str = "DocumentServer";

/// Sub-directory of [`DEFAULT_APP_DIR`] holding one directory per index.
pub const DEFAULT_INDEXES_DIR: &str = "Indexes";

/// Memory estimate reported when an index directory cannot be measured.
pub const DEFAULT_MEMORY_ESTIMATE_MB: f64 = 50.0;

/// Which analyzer to bind to every opened index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    /// Regex tokenizer, lowercase and English stop words.
    #[default]
    Standard,
    /// Regex tokenizer and lowercase, keeping stop words.
    StandardNoStop,
}

impl AnalyzerKind {
    /// Build a fresh analyzer of this kind.
    pub fn build(self) -> Result<Arc<dyn Analyzer>> {
        let analyzer = match self {
            AnalyzerKind::Standard => StandardAnalyzer::new()?,
            AnalyzerKind::StandardNoStop => StandardAnalyzer::without_stop_words()?,
        };
        Ok(Arc::new(analyzer))
    }
}

/// Configuration of the segment writer bound to each loaded index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexWriterConfig {
    /// Number of buffered documents that triggers a segment flush.
    pub max_buffered_docs: usize,

    /// File name prefix for segment files.
    pub segment_prefix: String,
}

impl Default for IndexWriterConfig {
    fn default() -> Self {
        IndexWriterConfig {
            max_buffered_docs: 1000,
            segment_prefix: "segment".to_string(),
        }
    }
}

/// Configuration for [`IndexManager`](crate::manager::IndexManager).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexManagerConfig {
    /// Directory holding one sub-directory per index.
    pub storage_root: PathBuf,

    /// Estimate (MB) reported when an index directory cannot be listed.
    pub default_memory_estimate_mb: f64,

    /// Analyzer bound to every opened index.
    pub analyzer: AnalyzerKind,

    /// Segment writer settings.
    pub writer: IndexWriterConfig,

    /// File storage settings for index directories.
    pub storage: FileStorageConfig,
}

impl Default for IndexManagerConfig {
    fn default() -> Self {
        IndexManagerConfig {
            storage_root: default_storage_root(),
            default_memory_estimate_mb: DEFAULT_MEMORY_ESTIMATE_MB,
            analyzer: AnalyzerKind::default(),
            writer: IndexWriterConfig::default(),
            storage: FileStorageConfig::default(),
        }
    }
}

impl IndexManagerConfig {
    /// Create a default configuration rooted at `storage_root`.
    pub fn new<P: Into<PathBuf>>(storage_root: P) -> Self {
        IndexManagerConfig {
            storage_root: storage_root.into(),
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DocIndexError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: IndexManagerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the manager cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(DocIndexError::config("storage_root must not be empty"));
        }
        if !(self.default_memory_estimate_mb > 0.0) {
            return Err(DocIndexError::config(
                "default_memory_estimate_mb must be positive",
            ));
        }
        if self.writer.max_buffered_docs == 0 {
            return Err(DocIndexError::config(
                "writer.max_buffered_docs must be at least 1",
            ));
        }
        if self.writer.segment_prefix.is_empty()
            || self.writer.segment_prefix.starts_with("segments")
        {
            return Err(DocIndexError::config(
                "writer.segment_prefix must be non-empty and must not start with 'segments'",
            ));
        }
        Ok(())
    }
}

/// `<local data dir>/DocumentServer/Indexes`, or a relative path when the
/// platform reports no data directory.
pub fn default_storage_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_APP_DIR)
        .join(DEFAULT_INDEXES_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = IndexManagerConfig::default();

        assert!(config.storage_root.ends_with("DocumentServer/Indexes"));
        assert_eq!(config.default_memory_estimate_mb, 50.0);
        assert_eq!(config.analyzer, AnalyzerKind::Standard);
        assert_eq!(config.writer.max_buffered_docs, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = IndexManagerConfig::new("/tmp/indexes");
        config.default_memory_estimate_mb = 0.0;
        assert!(config.validate().is_err());

        let mut config = IndexManagerConfig::new("/tmp/indexes");
        config.writer.max_buffered_docs = 0;
        assert!(config.validate().is_err());

        let mut config = IndexManagerConfig::new("/tmp/indexes");
        config.writer.segment_prefix = "segments".to_string();
        assert!(config.validate().is_err());

        assert!(IndexManagerConfig::new("").validate().is_err());
    }

    #[test]
    fn test_from_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "storage_root": "/srv/indexes", "analyzer": "standard_no_stop" }"#,
        )
        .unwrap();

        let config = IndexManagerConfig::from_file(&path).unwrap();

        assert_eq!(config.storage_root, PathBuf::from("/srv/indexes"));
        assert_eq!(config.analyzer, AnalyzerKind::StandardNoStop);
        assert_eq!(config.writer.segment_prefix, "segment");
        assert_eq!(config.default_memory_estimate_mb, 50.0);
    }

    #[test]
    fn test_analyzer_kind_build() {
        let analyzer = AnalyzerKind::StandardNoStop.build().unwrap();
        assert_eq!(analyzer.name(), "standard_no_stop");
        assert_eq!(analyzer.terms("The Report").unwrap(), vec!["the", "report"]);
    }
}
