//! Memory residency reporting.

use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

const BYTES_PER_MB: f64 = 1_048_576.0;

/// Residency snapshot for one catalogued index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexMemoryStatus {
    /// Always `true` for catalogued indexes.
    pub discovered: bool,
    pub loaded: bool,
    /// Size of the index directory in MB while loaded, 0 otherwise.
    pub estimated_memory_mb: f64,
}

/// Total size of the files directly inside `directory`, in MB.
pub fn directory_size_mb(directory: &Path) -> std::io::Result<f64> {
    let mut total = 0u64;
    for entry in std::fs::read_dir(directory)? {
        let metadata = entry?.metadata()?;
        if metadata.is_file() {
            total += metadata.len();
        }
    }
    Ok(total as f64 / BYTES_PER_MB)
}

/// Estimate the footprint of an index.
///
/// Unloaded indexes cost nothing. When the directory of a loaded index
/// cannot be measured, `fallback_mb` is reported instead.
pub fn estimate_memory_mb(directory: &Path, loaded: bool, fallback_mb: f64) -> f64 {
    if !loaded {
        return 0.0;
    }
    match directory_size_mb(directory) {
        Ok(size) => size,
        Err(e) => {
            warn!(
                "cannot measure {}, assuming {fallback_mb} MB: {e}",
                directory.display()
            );
            fallback_mb
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_size() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.seg"), vec![0u8; 524_288]).unwrap();
        std::fs::write(dir.path().join("b.seg"), vec![0u8; 524_288]).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.seg"), vec![0u8; 4096]).unwrap();

        assert_eq!(directory_size_mb(dir.path()).unwrap(), 1.0);
    }

    #[test]
    fn test_estimate() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("segments_1"), b"{}").unwrap();

        assert_eq!(estimate_memory_mb(dir.path(), false, 50.0), 0.0);
        assert!(estimate_memory_mb(dir.path(), true, 50.0) > 0.0);

        let missing = dir.path().join("missing");
        assert_eq!(estimate_memory_mb(&missing, true, 50.0), 50.0);
        assert_eq!(estimate_memory_mb(&missing, false, 50.0), 0.0);
    }
}
