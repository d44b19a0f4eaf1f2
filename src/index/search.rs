//! Term-matching search over the in-memory postings of one index.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::index::postings::{TermPostingIndex, term_key};

/// A single search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub doc_id: u64,
    pub score: f32,
    pub document: Document,
}

/// Score live documents against analyzed query terms.
///
/// A document matches when it contains any of `terms` in `field` (or in
/// any of `fields` when `field` is `None`). Each matching term contributes
/// `tf * ln(1 + N / df)`, where `N` is the number of live documents and
/// `df` the number of live documents containing the term. Hits are ordered
/// by descending score, ties by ascending doc id.
pub fn search_terms(
    postings: &TermPostingIndex,
    documents: &BTreeMap<u64, Document>,
    fields: &BTreeSet<String>,
    terms: &[String],
    field: Option<&str>,
    limit: usize,
) -> Vec<SearchHit> {
    if limit == 0 || documents.is_empty() {
        return Vec::new();
    }

    let total_docs = documents.len() as f32;
    let mut scores: AHashMap<u64, f32> = AHashMap::new();

    let unique_terms: BTreeSet<&String> = terms.iter().collect();
    let search_fields: Vec<&str> = match field {
        Some(field) => vec![field],
        None => fields.iter().map(String::as_str).collect(),
    };

    for term in unique_terms {
        for field in &search_fields {
            let live: Vec<_> = postings
                .get(&term_key(field, term))
                .iter()
                .filter(|posting| documents.contains_key(&posting.doc_id))
                .collect();
            if live.is_empty() {
                continue;
            }

            let idf = (1.0 + total_docs / live.len() as f32).ln();
            for posting in live {
                *scores.entry(posting.doc_id).or_insert(0.0) += posting.frequency as f32 * idf;
            }
        }
    }

    let mut ranked: Vec<(u64, f32)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .filter_map(|(doc_id, score)| {
            documents.get(&doc_id).map(|document| SearchHit {
                doc_id,
                score,
                document: document.clone(),
            })
        })
        .collect()
}
