//! On-disk full-text indexes.
//!
//! An index is a directory of segment files plus one commit point:
//!
//! ```text
//! <index dir>/
//!   segments_3            # commit point (JSON); its presence marks a valid index
//!   segment_000000.seg    # bincode segment + crc32 trailer
//!   segment_000001.seg
//!   write.lock            # OS-locked while a writer holds the index open
//! ```
//!
//! [`writer::IndexWriter`] is the single entry point for reading and writing
//! an index: it loads the latest commit point on open, keeps the live
//! documents and their postings in memory, and writes new segments and
//! commit points as documents change.

pub mod postings;
pub mod search;
pub mod segment;
pub mod writer;
