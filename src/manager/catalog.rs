//! Index names and the catalog of indexes known to exist on disk.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::{debug, warn};

use crate::error::{DocIndexError, Result};
use crate::index::segment::is_commit_marker;

/// Longest accepted index name, in bytes.
pub const MAX_INDEX_NAME_LEN: usize = 255;

/// A validated index name.
///
/// The name doubles as the index's directory name under the storage root,
/// so it may not contain path separators or traversal components.
///
/// ```
/// use docindex::manager::catalog::IndexName;
///
/// assert!(IndexName::new("reports-2024").is_ok());
/// assert!(IndexName::new("../etc").is_err());
/// assert!(IndexName::new("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexName(String);

impl IndexName {
    /// Validate `name` and wrap it.
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();

        let reason = if name.is_empty() {
            Some("name is empty")
        } else if name == "." || name == ".." {
            Some("name is a relative path component")
        } else if name.len() > MAX_INDEX_NAME_LEN {
            Some("name is longer than 255 bytes")
        } else if name.contains(['/', '\\', ':']) {
            Some("name contains a path separator")
        } else if name.chars().any(char::is_control) {
            Some("name contains a control character")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(DocIndexError::invalid_name(name, reason)),
            None => Ok(IndexName(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IndexName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for IndexName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for IndexName {
    type Err = DocIndexError;

    fn from_str(s: &str) -> Result<Self> {
        IndexName::new(s)
    }
}

/// The set of index names known to exist under the storage root.
///
/// Membership says nothing about whether an index is loaded.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    names: BTreeSet<IndexName>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            names: BTreeSet::new(),
        }
    }

    /// Add a name, returning `true` if it was not present.
    pub fn insert(&mut self, name: IndexName) -> bool {
        self.names.insert(name)
    }

    /// Remove a name, returning `true` if it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// All names in lexicographic order.
    pub fn names(&self) -> Vec<String> {
        self.names.iter().map(|name| name.to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexName> {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}

impl Extend<IndexName> for Catalog {
    fn extend<T: IntoIterator<Item = IndexName>>(&mut self, iter: T) {
        self.names.extend(iter);
    }
}

/// Whether `directory` holds at least one commit point marker file.
pub fn has_commit_marker(directory: &Path) -> std::io::Result<bool> {
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        if entry.file_type()?.is_file()
            && entry.file_name().to_str().is_some_and(is_commit_marker)
        {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Scan the immediate sub-directories of `root` for indexes.
///
/// A sub-directory is an index when it holds a commit point marker.
/// Directories with unusable names or unreadable content are skipped.
/// Fails only when `root` itself cannot be listed.
pub fn scan_storage_root(root: &Path) -> Result<Vec<IndexName>> {
    let entries = std::fs::read_dir(root).map_err(|e| {
        DocIndexError::DiscoveryFailure(format!("cannot list {}: {e}", root.display()))
    })?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry in {}: {e}", root.display());
                continue;
            }
        };

        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            warn!("skipping non UTF-8 directory {}", path.display());
            continue;
        };

        let name = match IndexName::new(file_name) {
            Ok(name) => name,
            Err(e) => {
                warn!("skipping directory {}: {e}", path.display());
                continue;
            }
        };

        match has_commit_marker(&path) {
            Ok(true) => {
                debug!("discovered index {name}");
                found.push(name);
            }
            Ok(false) => debug!("ignoring {}: no commit point", path.display()),
            Err(e) => warn!("skipping {}: {e}", path.display()),
        }
    }

    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_index_name_validation() {
        assert_eq!(IndexName::new("reports").unwrap().as_str(), "reports");
        assert!(IndexName::new("Q1 Reports.v2").is_ok());

        for bad in ["", ".", "..", "a/b", "a\\b", "c:", "tab\there", "nul\0"] {
            assert!(IndexName::new(bad).is_err(), "{bad:?} should be rejected");
        }

        assert!(IndexName::new("x".repeat(255)).is_ok());
        assert!(IndexName::new("x".repeat(256)).is_err());
    }

    #[test]
    fn test_catalog_set_semantics() {
        let mut catalog = Catalog::new();

        assert!(catalog.insert(IndexName::new("b").unwrap()));
        assert!(catalog.insert(IndexName::new("a").unwrap()));
        assert!(!catalog.insert(IndexName::new("a").unwrap()));

        assert_eq!(catalog.names(), vec!["a", "b"]);
        assert!(catalog.contains("a"));
        assert!(catalog.remove("a"));
        assert!(!catalog.remove("a"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_scan_storage_root() {
        let root = TempDir::new().unwrap();

        let valid = root.path().join("reports");
        std::fs::create_dir(&valid).unwrap();
        std::fs::write(valid.join("segments_1"), b"{}").unwrap();

        // No commit point.
        std::fs::create_dir(root.path().join("scratch")).unwrap();

        // Plain files at the root are ignored.
        std::fs::write(root.path().join("segments_1"), b"{}").unwrap();

        let found = scan_storage_root(root.path()).unwrap();
        assert_eq!(found, vec![IndexName::new("reports").unwrap()]);

        // Scanning is repeatable.
        assert_eq!(scan_storage_root(root.path()).unwrap(), found);
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let root = TempDir::new().unwrap();
        let err = scan_storage_root(&root.path().join("missing")).unwrap_err();
        assert!(matches!(err, DocIndexError::DiscoveryFailure(_)));
    }
}
