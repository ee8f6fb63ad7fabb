//! In-memory index segments.
//!
//! Segments are immutable once built; [`MemorySegmentWriter`] accumulates
//! documents and freezes them into a [`MemorySegment`]. The on-disk segment
//! format lives in the storage layer and is out of scope here; every
//! consumer goes through the [`SegmentReader`] seam.

use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;

use crate::analysis::analyzer::Analyzer;
use crate::index::postings::{MemoryPostingIterator, Posting, PostingIterator};

/// Per-term statistics within one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermInfo {
    /// Number of documents containing the term.
    pub doc_freq: u64,
    /// Total number of occurrences across documents.
    pub total_freq: u64,
}

/// Per-field statistics within one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    /// Number of documents with this field.
    pub doc_count: u64,
    /// Total number of term occurrences in this field.
    pub total_terms: u64,
    /// Average field length in tokens.
    pub avg_length: f64,
}

/// Read access to one immutable segment.
pub trait SegmentReader: Send + Sync + fmt::Debug {
    /// Number of documents in the segment.
    fn doc_count(&self) -> u64;

    /// One past the highest document id.
    fn max_doc(&self) -> u64;

    /// Statistics for a term, `None` when absent.
    fn term_info(&self, field: &str, term: &str) -> Option<TermInfo>;

    /// A posting iterator for a term, `None` when absent.
    fn postings(&self, field: &str, term: &str) -> Option<Box<dyn PostingIterator>>;

    /// Statistics for a field, `None` when no document has it.
    fn field_stats(&self, field: &str) -> Option<FieldStats>;

    /// Length in tokens of `field` in `doc_id` (0 when absent).
    fn doc_length(&self, field: &str, doc_id: u64) -> u64;
}

#[derive(Debug, Default)]
struct FieldData {
    terms: AHashMap<String, Arc<Vec<Posting>>>,
    doc_lengths: AHashMap<u64, u64>,
    total_terms: u64,
}

/// An immutable in-memory segment.
#[derive(Debug, Default)]
pub struct MemorySegment {
    fields: AHashMap<String, FieldData>,
    doc_count: u64,
}

impl MemorySegment {
    /// Start building a segment.
    pub fn writer() -> MemorySegmentWriter {
        MemorySegmentWriter::default()
    }
}

impl SegmentReader for MemorySegment {
    fn doc_count(&self) -> u64 {
        self.doc_count
    }

    fn max_doc(&self) -> u64 {
        self.doc_count
    }

    fn term_info(&self, field: &str, term: &str) -> Option<TermInfo> {
        let postings = self.fields.get(field)?.terms.get(term)?;
        Some(TermInfo {
            doc_freq: postings.len() as u64,
            total_freq: postings.iter().map(|p| p.positions.len() as u64).sum(),
        })
    }

    fn postings(&self, field: &str, term: &str) -> Option<Box<dyn PostingIterator>> {
        let postings = self.fields.get(field)?.terms.get(term)?;
        Some(Box::new(MemoryPostingIterator::new(postings.clone())))
    }

    fn field_stats(&self, field: &str) -> Option<FieldStats> {
        let data = self.fields.get(field)?;
        let doc_count = data.doc_lengths.len() as u64;
        if doc_count == 0 {
            return None;
        }
        Some(FieldStats {
            doc_count,
            total_terms: data.total_terms,
            avg_length: data.total_terms as f64 / doc_count as f64,
        })
    }

    fn doc_length(&self, field: &str, doc_id: u64) -> u64 {
        self.fields
            .get(field)
            .and_then(|data| data.doc_lengths.get(&doc_id).copied())
            .unwrap_or(0)
    }
}

/// Accumulates documents and freezes them into a [`MemorySegment`].
///
/// Document ids are dense from 0 in insertion order.
///
/// # Examples
///
/// ```
/// use sagitta::index::segment::{MemorySegment, SegmentReader};
///
/// let mut writer = MemorySegment::writer();
/// writer.add_tokens("body", &["quick", "brown", "fox"]);
/// writer.add_tokens("body", &["lazy", "dog"]);
/// let segment = writer.finish();
///
/// assert_eq!(segment.doc_count(), 2);
/// assert_eq!(segment.term_info("body", "fox").unwrap().doc_freq, 1);
/// ```
#[derive(Debug, Default)]
pub struct MemorySegmentWriter {
    fields: AHashMap<String, FieldData>,
    next_doc: u64,
}

impl MemorySegmentWriter {
    /// Add a document whose `field` holds `tokens`, one position each.
    /// Returns the document id.
    pub fn add_tokens(&mut self, field: &str, tokens: &[&str]) -> u64 {
        let doc_id = self.next_doc;
        self.next_doc += 1;
        self.insert(field, doc_id, tokens.iter().enumerate().map(|(i, t)| (t.to_string(), i as u64)));
        doc_id
    }

    /// Add a document by running `analyzer` over `text`; token positions
    /// follow the analyzer's increments. Returns the document id, or `None`
    /// when the analyzer rejects the input.
    pub fn add_analyzed(
        &mut self,
        field: &str,
        text: &str,
        analyzer: &mut dyn Analyzer,
    ) -> Option<u64> {
        if !analyzer.reset(text) {
            return None;
        }
        let mut tokens = Vec::new();
        let mut pos = u64::MAX;
        while analyzer.next() {
            let token = analyzer.token();
            pos = pos.wrapping_add(u64::from(token.increment));
            tokens.push((token.term.clone(), pos));
        }

        let doc_id = self.next_doc;
        self.next_doc += 1;
        self.insert(field, doc_id, tokens);
        Some(doc_id)
    }

    fn insert(&mut self, field: &str, doc_id: u64, tokens: impl IntoIterator<Item = (String, u64)>) {
        let data = self.fields.entry(field.to_string()).or_default();
        let mut length = 0;
        for (term, position) in tokens {
            length += 1;
            let postings = Arc::get_mut(data.terms.entry(term).or_insert_with(|| Arc::new(Vec::new())))
                .expect("writer owns postings exclusively");
            match postings.last_mut() {
                Some(last) if last.doc_id == doc_id => {
                    // Keep positions strictly ascending; the same term
                    // overlaying its own position adds nothing.
                    if last.positions.last() != Some(&position) {
                        last.positions.push(position);
                    }
                }
                _ => postings.push(Posting {
                    doc_id,
                    positions: vec![position],
                }),
            }
        }
        data.total_terms += length;
        data.doc_lengths.insert(doc_id, length);
    }

    /// Freeze the accumulated documents into an immutable segment.
    pub fn finish(self) -> MemorySegment {
        MemorySegment {
            doc_count: self.next_doc,
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::delimiter::DelimiterAnalyzer;

    #[test]
    fn test_term_and_field_stats() {
        let mut writer = MemorySegment::writer();
        writer.add_tokens("body", &["a", "b", "a"]);
        writer.add_tokens("body", &["b"]);
        writer.add_tokens("title", &["x"]);
        let segment = writer.finish();

        assert_eq!(segment.doc_count(), 3);

        let a = segment.term_info("body", "a").unwrap();
        assert_eq!(a.doc_freq, 1);
        assert_eq!(a.total_freq, 2);

        let b = segment.term_info("body", "b").unwrap();
        assert_eq!(b.doc_freq, 2);
        assert_eq!(b.total_freq, 2);

        assert!(segment.term_info("body", "z").is_none());
        assert!(segment.term_info("nope", "a").is_none());

        let stats = segment.field_stats("body").unwrap();
        assert_eq!(stats.doc_count, 2);
        assert_eq!(stats.total_terms, 4);
        assert_eq!(stats.avg_length, 2.0);

        assert_eq!(segment.doc_length("body", 0), 3);
        assert_eq!(segment.doc_length("body", 1), 1);
        assert_eq!(segment.doc_length("body", 2), 0);
    }

    #[test]
    fn test_positions_in_postings() {
        let mut writer = MemorySegment::writer();
        writer.add_tokens("body", &["a", "b", "a", "a"]);
        let segment = writer.finish();

        let mut it = segment.postings("body", "a").unwrap();
        assert!(it.next().unwrap());
        assert_eq!(it.doc_id(), 0);
        assert_eq!(it.positions(), &[0, 2, 3]);
        assert!(!it.next().unwrap());
    }

    #[test]
    fn test_add_analyzed_uses_increments() {
        let mut writer = MemorySegment::writer();
        let mut analyzer = DelimiterAnalyzer::new(" ".to_string());
        let doc = writer.add_analyzed("body", "x y x", &mut analyzer).unwrap();
        let segment = writer.finish();

        assert_eq!(doc, 0);
        let mut it = segment.postings("body", "x").unwrap();
        assert!(it.next().unwrap());
        assert_eq!(it.positions(), &[0, 2]);
        assert_eq!(segment.doc_length("body", 0), 3);
    }
}
