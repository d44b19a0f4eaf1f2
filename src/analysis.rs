//! Text analysis for docindex.
//!
//! Analysis turns raw document text into the terms stored in an index:
//! a tokenizer splits text into tokens and a chain of filters normalizes
//! them. The same analyzer is bound to an index's writer and is used to
//! analyze queries against it.

pub mod analyzer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;
