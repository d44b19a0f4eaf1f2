//! Segment files and commit points.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{DocIndexError, Result};
use crate::index::postings::Posting;
use crate::storage::{Storage, read_all, write_atomic};

/// File name prefix shared by every commit point file.
pub const SEGMENTS_PREFIX: &str = "segments";

/// File extension of segment files.
pub const SEGMENT_EXTENSION: &str = "seg";

/// Whether `file_name` is a commit point marker.
///
/// ```
/// use docindex::index::segment::is_commit_marker;
///
/// assert!(is_commit_marker("segments_4"));
/// assert!(!is_commit_marker("segment_000001.seg"));
/// ```
pub fn is_commit_marker(file_name: &str) -> bool {
    file_name.starts_with(SEGMENTS_PREFIX)
}

/// Parse the generation out of a `segments_<N>` file name.
pub fn parse_generation(file_name: &str) -> Option<u64> {
    file_name
        .strip_prefix(SEGMENTS_PREFIX)?
        .strip_prefix('_')?
        .parse()
        .ok()
}

/// A document as stored in a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub doc_id: u64,
    pub document: Document,
}

/// Content of one immutable segment file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentData {
    /// Stored documents, ordered by doc id.
    pub documents: Vec<StoredDocument>,
    /// `field:term` → postings for the documents in this segment.
    pub postings: BTreeMap<String, Vec<Posting>>,
}

impl SegmentData {
    /// Serialize the segment and append a crc32 checksum.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut data = bincode::serialize(self)?;
        let checksum = crc32fast::hash(&data);
        data.extend_from_slice(&checksum.to_le_bytes());
        Ok(data)
    }

    /// Verify the checksum trailer and deserialize.
    pub fn decode(name: &str, data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(DocIndexError::index(format!("Segment {name} is truncated")));
        }
        let (body, trailer) = data.split_at(data.len() - 4);
        let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let actual = crc32fast::hash(body);
        if expected != actual {
            return Err(DocIndexError::index(format!(
                "Checksum mismatch in segment {name}: expected {expected:08x}, got {actual:08x}"
            )));
        }
        Ok(bincode::deserialize(body)?)
    }

    /// Write this segment to `name` in `storage`.
    pub fn write_to(&self, storage: &dyn Storage, name: &str) -> Result<()> {
        let data = self.encode()?;
        let mut output = storage.create_output(name)?;
        output.write_all(&data)?;
        output.close()?;
        debug!(
            "wrote segment {name} ({} docs, {} bytes)",
            self.documents.len(),
            data.len()
        );
        Ok(())
    }

    /// Read the segment stored at `name`.
    pub fn read_from(storage: &dyn Storage, name: &str) -> Result<Self> {
        let data = read_all(storage, name)?;
        Self::decode(name, &data)
    }
}

/// The set of segments and deletions that make up a committed index.
///
/// Generation 0 means the index has never been committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitPoint {
    pub generation: u64,
    pub segments: Vec<String>,
    pub deleted: BTreeSet<u64>,
    pub next_doc_id: u64,
    pub next_segment: u32,
    pub committed_at: Option<DateTime<Utc>>,
}

impl Default for CommitPoint {
    fn default() -> Self {
        CommitPoint {
            generation: 0,
            segments: Vec::new(),
            deleted: BTreeSet::new(),
            next_doc_id: 0,
            next_segment: 0,
            committed_at: None,
        }
    }
}

impl CommitPoint {
    /// File name of this commit point.
    pub fn file_name(&self) -> String {
        format!("{SEGMENTS_PREFIX}_{}", self.generation)
    }

    /// Whether this commit point has ever been written.
    pub fn is_committed(&self) -> bool {
        self.generation > 0
    }

    /// Load the newest commit point in `storage`, or `None` for an empty
    /// directory.
    pub fn load_latest(storage: &dyn Storage) -> Result<Option<Self>> {
        let latest = storage
            .list_files()?
            .iter()
            .filter_map(|name| parse_generation(name).map(|g| (g, name.clone())))
            .max_by_key(|(generation, _)| *generation);

        match latest {
            Some((generation, name)) => {
                let data = read_all(storage, &name)?;
                let commit: CommitPoint = serde_json::from_slice(&data)?;
                if commit.generation != generation {
                    return Err(DocIndexError::index(format!(
                        "Commit point {name} records generation {}",
                        commit.generation
                    )));
                }
                Ok(Some(commit))
            }
            None => Ok(None),
        }
    }

    /// Atomically write this commit point, then remove older commit points
    /// and segment files it no longer references.
    pub fn write_to(&self, storage: &dyn Storage) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        write_atomic(storage, &self.file_name(), &data)?;

        for name in storage.list_files()? {
            let stale_commit = parse_generation(&name).is_some_and(|g| g < self.generation);
            let orphan_segment = name.ends_with(&format!(".{SEGMENT_EXTENSION}"))
                && !self.segments.contains(&name);
            if stale_commit || orphan_segment {
                debug!("removing unreferenced file {name}");
                storage.delete_file(&name)?;
            }
        }
        Ok(())
    }
}
