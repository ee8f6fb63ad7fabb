//! Posting iterators: cursors over the documents and positions of one term.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// Document id boundaries.
pub mod doc_limits {
    /// End-of-stream sentinel.
    pub const EOF: u64 = u64::MAX;

    /// Check whether a document id is the end-of-stream sentinel.
    pub fn eof(doc_id: u64) -> bool {
        doc_id == EOF
    }
}

/// A cursor over the posting list of one term in one field.
///
/// Documents come out in strictly ascending order; positions within a
/// document are strictly ascending. `doc_id()` is [`doc_limits::EOF`]
/// before the first `next()` succeeds and after exhaustion.
pub trait PostingIterator: Send + fmt::Debug {
    /// The current document id.
    fn doc_id(&self) -> u64;

    /// Number of occurrences of the term in the current document.
    fn term_freq(&self) -> u64;

    /// Positions of the term in the current document, ascending.
    fn positions(&self) -> &[u64];

    /// Advance to the next document.
    fn next(&mut self) -> Result<bool>;

    /// Advance to the first document with id `>= target` and return it
    /// (or [`doc_limits::EOF`]). Seeking backwards is a no-op.
    fn seek(&mut self, target: u64) -> Result<u64>;

    /// Estimated number of documents in this posting list.
    fn cost(&self) -> u64;
}

/// A posting iterator over no documents, used for absent terms.
#[derive(Debug, Default)]
pub struct EmptyPostingIterator;

impl PostingIterator for EmptyPostingIterator {
    fn doc_id(&self) -> u64 {
        doc_limits::EOF
    }

    fn term_freq(&self) -> u64 {
        0
    }

    fn positions(&self) -> &[u64] {
        &[]
    }

    fn next(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn seek(&mut self, _target: u64) -> Result<u64> {
        Ok(doc_limits::EOF)
    }

    fn cost(&self) -> u64 {
        0
    }
}

/// One document entry in an in-memory posting list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    /// Document id.
    pub doc_id: u64,
    /// Ascending positions of the term within the document.
    pub positions: Vec<u64>,
}

/// A posting iterator over an in-memory posting list shared with its
/// segment.
#[derive(Debug)]
pub struct MemoryPostingIterator {
    postings: Arc<Vec<Posting>>,
    /// Index of the next entry to visit.
    cursor: usize,
    current: Option<usize>,
}

impl MemoryPostingIterator {
    /// Create an iterator positioned before the first document.
    pub fn new(postings: Arc<Vec<Posting>>) -> Self {
        MemoryPostingIterator {
            postings,
            cursor: 0,
            current: None,
        }
    }
}

impl PostingIterator for MemoryPostingIterator {
    fn doc_id(&self) -> u64 {
        match self.current {
            Some(i) => self.postings[i].doc_id,
            None => doc_limits::EOF,
        }
    }

    fn term_freq(&self) -> u64 {
        match self.current {
            Some(i) => self.postings[i].positions.len() as u64,
            None => 0,
        }
    }

    fn positions(&self) -> &[u64] {
        match self.current {
            Some(i) => &self.postings[i].positions,
            None => &[],
        }
    }

    fn next(&mut self) -> Result<bool> {
        if self.cursor < self.postings.len() {
            self.current = Some(self.cursor);
            self.cursor += 1;
            Ok(true)
        } else {
            self.current = None;
            Ok(false)
        }
    }

    fn seek(&mut self, target: u64) -> Result<u64> {
        if let Some(i) = self.current {
            if self.postings[i].doc_id >= target {
                return Ok(self.postings[i].doc_id);
            }
        }
        while self.cursor < self.postings.len() && self.postings[self.cursor].doc_id < target {
            self.cursor += 1;
        }
        if self.next()? {
            Ok(self.doc_id())
        } else {
            Ok(doc_limits::EOF)
        }
    }

    fn cost(&self) -> u64 {
        self.postings.len() as u64
    }
}
