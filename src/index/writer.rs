//! Segment-based index writer.
//!
//! An [`IndexWriter`] owns the exclusively opened storage of one index for
//! as long as it is open. Committed segments are loaded into memory when the
//! writer opens; new documents are buffered, flushed into a new segment file
//! once [`IndexWriterConfig::max_buffered_docs`] is reached, and become
//! durable when [`commit`](IndexWriter::commit) writes a new commit point.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use ahash::AHashMap;
use chrono::Utc;
use log::{debug, info};

use crate::analysis::analyzer::Analyzer;
use crate::config::IndexWriterConfig;
use crate::document::Document;
use crate::error::{DocIndexError, Result};
use crate::index::postings::{Posting, TermPostingIndex, term_key};
use crate::index::search::{SearchHit, search_terms};
use crate::index::segment::{CommitPoint, SEGMENT_EXTENSION, SegmentData, StoredDocument};
use crate::storage::Storage;

/// Writer and searcher over the segments of one index.
pub struct IndexWriter {
    /// The storage backend.
    storage: Arc<dyn Storage>,

    /// Analyzer applied to document fields and queries.
    analyzer: Arc<dyn Analyzer>,

    /// Writer configuration.
    config: IndexWriterConfig,

    /// Last durable commit point.
    commit: CommitPoint,

    /// Segments written so far, committed or not.
    segments: Vec<String>,

    /// Live documents by id.
    documents: BTreeMap<u64, Document>,

    /// Postings over every loaded and buffered document.
    postings: TermPostingIndex,

    /// Field names seen in any document.
    fields: BTreeSet<String>,

    /// Documents not yet flushed to a segment.
    buffered: Vec<StoredDocument>,

    /// Postings of the buffered documents.
    buffered_postings: BTreeMap<String, Vec<Posting>>,

    /// Ids of documents deleted from written segments.
    deleted: BTreeSet<u64>,

    next_doc_id: u64,
    next_segment: u32,

    /// Whether anything changed since the last commit.
    dirty: bool,

    /// Whether the writer is closed.
    closed: bool,
}

impl std::fmt::Debug for IndexWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexWriter")
            .field("storage", &self.storage)
            .field("analyzer", &self.analyzer.name())
            .field("config", &self.config)
            .field("generation", &self.commit.generation)
            .field("segments", &self.segments)
            .field("doc_count", &self.documents.len())
            .field("buffered_docs_count", &self.buffered.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl IndexWriter {
    /// Open a writer over `storage`, loading the latest commit point.
    ///
    /// An empty storage opens as an uncommitted index with no documents.
    pub fn open(
        storage: Arc<dyn Storage>,
        analyzer: Arc<dyn Analyzer>,
        config: IndexWriterConfig,
    ) -> Result<Self> {
        let commit = CommitPoint::load_latest(storage.as_ref())?.unwrap_or_default();

        let mut writer = IndexWriter {
            storage,
            analyzer,
            config,
            commit: CommitPoint::default(),
            segments: Vec::new(),
            documents: BTreeMap::new(),
            postings: TermPostingIndex::new(),
            fields: BTreeSet::new(),
            buffered: Vec::new(),
            buffered_postings: BTreeMap::new(),
            deleted: BTreeSet::new(),
            next_doc_id: 0,
            next_segment: 0,
            dirty: false,
            // Closed until loading succeeds; a half-loaded writer must not
            // commit on drop.
            closed: true,
        };
        writer.reset_to(commit)?;
        writer.closed = false;

        debug!(
            "opened writer at generation {} ({} segments, {} docs)",
            writer.commit.generation,
            writer.segments.len(),
            writer.documents.len()
        );
        Ok(writer)
    }

    /// Replace in-memory state with the content of `commit`.
    fn reset_to(&mut self, commit: CommitPoint) -> Result<()> {
        self.documents.clear();
        self.postings = TermPostingIndex::new();
        self.fields.clear();
        self.buffered.clear();
        self.buffered_postings.clear();

        for name in &commit.segments {
            let segment = SegmentData::read_from(self.storage.as_ref(), name)?;

            for stored in segment.documents {
                if commit.deleted.contains(&stored.doc_id) {
                    continue;
                }
                self.fields.extend(stored.document.fields().keys().cloned());
                self.documents.insert(stored.doc_id, stored.document);
            }

            for (term, postings) in segment.postings {
                for posting in postings {
                    if self.documents.contains_key(&posting.doc_id) {
                        self.postings.add_posting(term.clone(), posting);
                    }
                }
            }
        }

        self.segments = commit.segments.clone();
        self.deleted = commit.deleted.clone();
        self.next_doc_id = commit.next_doc_id;
        self.next_segment = commit.next_segment;
        self.dirty = false;
        self.commit = commit;
        Ok(())
    }

    /// Add a document to the index, returning its id.
    pub fn add_document(&mut self, doc: Document) -> Result<u64> {
        self.check_closed()?;

        let mut term_frequencies: AHashMap<String, u32> = AHashMap::new();
        for (field, value) in doc.fields() {
            for term in self.analyzer.terms(value)? {
                *term_frequencies.entry(term_key(field, &term)).or_insert(0) += 1;
            }
        }

        let doc_id = self.next_doc_id;
        self.next_doc_id += 1;

        self.postings.add_document(doc_id, &term_frequencies);
        for (term, frequency) in term_frequencies {
            self.buffered_postings
                .entry(term)
                .or_default()
                .push(Posting::with_frequency(doc_id, frequency));
        }

        self.fields.extend(doc.fields().keys().cloned());
        self.documents.insert(doc_id, doc.clone());
        self.buffered.push(StoredDocument {
            doc_id,
            document: doc,
        });
        self.dirty = true;

        if self.buffered.len() >= self.config.max_buffered_docs {
            self.flush_segment()?;
        }

        Ok(doc_id)
    }

    /// Delete every live document whose `field` equals `value`.
    pub fn delete_documents(&mut self, field: &str, value: &str) -> Result<u64> {
        self.check_closed()?;

        let matching: Vec<u64> = self
            .documents
            .iter()
            .filter(|(_, doc)| doc.get_field(field) == Some(value))
            .map(|(doc_id, _)| *doc_id)
            .collect();

        for doc_id in &matching {
            self.documents.remove(doc_id);
            match self.buffered.iter().position(|stored| stored.doc_id == *doc_id) {
                Some(position) => {
                    self.buffered.remove(position);
                }
                None => {
                    self.deleted.insert(*doc_id);
                }
            }
        }

        if !matching.is_empty() {
            self.dirty = true;
        }
        Ok(matching.len() as u64)
    }

    /// Replace the documents whose `field` equals `value` with `doc`.
    pub fn update_document(&mut self, field: &str, value: &str, doc: Document) -> Result<u64> {
        self.delete_documents(field, value)?;
        self.add_document(doc)
    }

    /// Write buffered documents to a new segment file.
    fn flush_segment(&mut self) -> Result<()> {
        if self.buffered.is_empty() {
            return Ok(());
        }

        let segment_name = format!(
            "{}_{:06}.{SEGMENT_EXTENSION}",
            self.config.segment_prefix, self.next_segment
        );

        let live: BTreeSet<u64> = self.buffered.iter().map(|stored| stored.doc_id).collect();
        let postings = std::mem::take(&mut self.buffered_postings)
            .into_iter()
            .filter_map(|(term, postings)| {
                let postings: Vec<Posting> = postings
                    .into_iter()
                    .filter(|posting| live.contains(&posting.doc_id))
                    .collect();
                (!postings.is_empty()).then_some((term, postings))
            })
            .collect();

        let segment = SegmentData {
            documents: std::mem::take(&mut self.buffered),
            postings,
        };
        segment.write_to(self.storage.as_ref(), &segment_name)?;

        self.segments.push(segment_name);
        self.next_segment += 1;
        Ok(())
    }

    /// Commit all pending changes.
    ///
    /// Writes a new commit point when anything changed, or when the index
    /// has never been committed so that an empty index is still recognised
    /// on disk.
    pub fn commit(&mut self) -> Result<()> {
        self.check_closed()?;

        self.flush_segment()?;

        if !self.dirty && self.commit.is_committed() {
            return Ok(());
        }

        let commit = CommitPoint {
            generation: self.commit.generation + 1,
            segments: self.segments.clone(),
            deleted: self.deleted.clone(),
            next_doc_id: self.next_doc_id,
            next_segment: self.next_segment,
            committed_at: Some(Utc::now()),
        };
        commit.write_to(self.storage.as_ref())?;

        info!(
            "committed generation {} ({} segments, {} docs)",
            commit.generation,
            commit.segments.len(),
            self.documents.len()
        );
        self.commit = commit;
        self.dirty = false;
        Ok(())
    }

    /// Discard every change made since the last commit.
    pub fn rollback(&mut self) -> Result<()> {
        self.check_closed()?;

        for name in &self.segments {
            if !self.commit.segments.contains(name) {
                self.storage.delete_file(name)?;
            }
        }

        let commit = self.commit.clone();
        if let Err(e) = self.reset_to(commit) {
            self.closed = true;
            return Err(e);
        }
        Ok(())
    }

    /// Search live documents for `query`.
    ///
    /// The query is analyzed with the index analyzer. With `field` set only
    /// that field is matched, otherwise every known field is.
    pub fn search(&self, query: &str, field: Option<&str>, limit: usize) -> Result<Vec<SearchHit>> {
        self.check_closed()?;

        let terms = self.analyzer.terms(query)?;
        Ok(search_terms(
            &self.postings,
            &self.documents,
            &self.fields,
            &terms,
            field,
            limit,
        ))
    }

    /// Number of live documents, including uncommitted ones.
    pub fn doc_count(&self) -> u64 {
        self.documents.len() as u64
    }

    /// Get the number of documents not yet flushed to a segment.
    pub fn pending_docs(&self) -> u64 {
        self.buffered.len() as u64
    }

    /// Generation of the last commit point, 0 if never committed.
    pub fn generation(&self) -> u64 {
        self.commit.generation
    }

    /// Name of the analyzer bound to this writer.
    pub fn analyzer_name(&self) -> &str {
        self.analyzer.name()
    }

    /// Commit pending changes and close the writer.
    ///
    /// The writer is closed even when the final commit fails.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.commit();
        self.closed = true;
        result
    }

    /// Check if the writer is closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check_closed(&self) -> Result<()> {
        if self.closed {
            Err(DocIndexError::index("Writer is closed"))
        } else {
            Ok(())
        }
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
