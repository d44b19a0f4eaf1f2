//! In-memory postings for the documents of one index.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A single occurrence record of a term in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Document ID.
    pub doc_id: u64,
    /// Number of times the term occurs in the document field.
    pub frequency: u32,
}

impl Posting {
    /// Create a posting with the given term frequency.
    pub fn with_frequency(doc_id: u64, frequency: u32) -> Self {
        Posting { doc_id, frequency }
    }
}

/// Build the `field:term` key postings are stored under.
pub fn term_key(field: &str, term: &str) -> String {
    format!("{field}:{term}")
}

/// Term → postings map.
///
/// Postings are appended in document order and never removed; deleted
/// documents are filtered out by the caller against its live document set.
#[derive(Debug, Default, Clone)]
pub struct TermPostingIndex {
    postings: AHashMap<String, Vec<Posting>>,
}

impl TermPostingIndex {
    /// Create an empty posting index.
    pub fn new() -> Self {
        TermPostingIndex {
            postings: AHashMap::new(),
        }
    }

    /// Add a posting for a term.
    pub fn add_posting(&mut self, term: String, posting: Posting) {
        self.postings.entry(term).or_default().push(posting);
    }

    /// Add every term of an analyzed document.
    pub fn add_document(&mut self, doc_id: u64, term_frequencies: &AHashMap<String, u32>) {
        for (term, &frequency) in term_frequencies {
            self.add_posting(term.clone(), Posting::with_frequency(doc_id, frequency));
        }
    }

    /// Get the postings for a term.
    pub fn get(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct terms.
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }
}
