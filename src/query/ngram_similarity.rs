//! N-gram similarity filter.
//!
//! Finds documents containing the longest ordered subsequence of the query
//! terms and publishes its occurrence count and normalized length for
//! scoring. Duplicate query terms act as independent slots.

use std::sync::Arc;

use crate::analysis::token::MatchAttributes;
use crate::error::{Result, SagittaError};
use crate::index::postings::{doc_limits, PostingIterator};
use crate::index::reader::IndexReader;
use crate::index::segment::SegmentReader;
use crate::query::matcher::{EmptyMatcher, Matcher, PostingMatcher};
use crate::query::scorer::QueryStats;
use crate::query::sequence::match_slots;

/// Configuration of an n-gram similarity search.
///
/// # Examples
///
/// ```
/// use sagitta::query::ngram_similarity::NgramSimilarityFilter;
///
/// let filter = NgramSimilarityFilter::new("body")
///     .threshold(0.5)
///     .term("qu")
///     .term("ui")
///     .term("ic");
/// assert_eq!(filter.min_match(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct NgramSimilarityFilter {
    field: String,
    terms: Vec<String>,
    threshold: f32,
    boost: f32,
}

impl NgramSimilarityFilter {
    /// Create a filter over `field` with threshold 1 (all terms required).
    pub fn new<F: Into<String>>(field: F) -> Self {
        NgramSimilarityFilter {
            field: field.into(),
            terms: Vec::new(),
            threshold: 1.0,
            boost: 1.0,
        }
    }

    /// Set the match threshold in `(0, 1]`.
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Append one query term slot.
    pub fn term<T: Into<String>>(mut self, term: T) -> Self {
        self.terms.push(term.into());
        self
    }

    /// Append query term slots in order.
    pub fn terms<I, T>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.terms.extend(terms.into_iter().map(Into::into));
        self
    }

    /// Set the query boost.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// The searched field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Minimum number of slots a document must realize.
    pub fn min_match(&self) -> usize {
        ((self.threshold as f64) * (self.terms.len() as f64)).ceil().max(1.0) as usize
    }

    /// Validate the configuration and gather statistics from `reader`.
    ///
    /// Field statistics are collected once per segment and term statistics
    /// once per (segment, distinct term); matchers built later reuse them.
    pub fn prepare(&self, reader: &IndexReader) -> Result<PreparedNgramSimilarity> {
        if self.terms.is_empty() {
            return Err(SagittaError::config("ngram similarity requires at least one term"));
        }
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(SagittaError::config(format!(
                "ngram similarity threshold {} outside (0, 1]",
                self.threshold
            )));
        }

        let mut distinct: Vec<&str> = self.terms.iter().map(String::as_str).collect();
        distinct.sort_unstable();
        distinct.dedup();

        let mut field_docs = 0;
        let mut field_terms = 0;
        let mut term_doc_freqs: Vec<(String, u64)> =
            distinct.iter().map(|t| (t.to_string(), 0)).collect();
        for segment in reader.segments() {
            if let Some(stats) = segment.field_stats(&self.field) {
                field_docs += stats.doc_count;
                field_terms += stats.total_terms;
            }
            for (term, doc_freq) in term_doc_freqs.iter_mut() {
                if let Some(info) = segment.term_info(&self.field, term) {
                    *doc_freq += info.doc_freq;
                }
            }
        }
        term_doc_freqs.retain(|(_, df)| *df > 0);

        let stats = QueryStats {
            total_docs: reader.doc_count(),
            field_docs,
            avg_field_length: if field_docs == 0 {
                0.0
            } else {
                field_terms as f64 / field_docs as f64
            },
            term_doc_freqs,
        };

        Ok(PreparedNgramSimilarity {
            field: self.field.clone(),
            terms: self.terms.clone(),
            min_match: self.min_match(),
            boost: self.boost,
            stats,
        })
    }
}

/// A validated filter with collected statistics, ready to execute per
/// segment.
#[derive(Debug)]
pub struct PreparedNgramSimilarity {
    field: String,
    terms: Vec<String>,
    min_match: usize,
    boost: f32,
    stats: QueryStats,
}

impl PreparedNgramSimilarity {
    /// Statistics gathered during preparation.
    pub fn stats(&self) -> &QueryStats {
        &self.stats
    }

    /// The query boost.
    pub fn boost(&self) -> f32 {
        self.boost
    }

    /// The searched field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Build the matching document cursor for one segment.
    pub fn execute(&self, segment: &Arc<dyn SegmentReader>) -> Result<Box<dyn Matcher>> {
        let mut slots = Vec::with_capacity(self.terms.len());
        for (index, term) in self.terms.iter().enumerate() {
            if let Some(postings) = segment.postings(&self.field, term) {
                slots.push(SlotIterator { index, postings });
            }
        }

        // Fewer present slots than the required match count can never
        // produce a long enough subsequence.
        if slots.len() < self.min_match {
            return Ok(Box::new(EmptyMatcher::new()));
        }

        // A single-term query degenerates to a term query: the posting
        // frequency is the match frequency and the boost is 1.
        if self.terms.len() == 1 {
            let slot = slots.pop().expect("one present slot");
            return Ok(Box::new(PostingMatcher::new(slot.postings)));
        }

        Ok(Box::new(NgramSimilarityMatcher::new(
            slots,
            self.terms.len(),
            self.min_match,
        )?))
    }
}

#[derive(Debug)]
struct SlotIterator {
    /// Slot position in the query.
    index: usize,
    postings: Box<dyn PostingIterator>,
}

/// Leap-frog conjunction over per-slot posting iterators, running the
/// ordered match state machine on every candidate document.
#[derive(Debug)]
pub struct NgramSimilarityMatcher {
    slots: Vec<SlotIterator>,
    total_slots: usize,
    min_match: usize,
    doc: u64,
    started: bool,
    attributes: MatchAttributes,
    cost: u64,
}

impl NgramSimilarityMatcher {
    fn new(mut slots: Vec<SlotIterator>, total_slots: usize, min_match: usize) -> Result<Self> {
        let cost = slots.iter().map(|s| s.postings.cost()).sum();
        // Position every slot on its first document so an EOF doc id means
        // exhausted from here on.
        for slot in &mut slots {
            slot.postings.next()?;
        }
        Ok(NgramSimilarityMatcher {
            slots,
            total_slots,
            min_match,
            doc: doc_limits::EOF,
            started: false,
            attributes: MatchAttributes::default(),
            cost,
        })
    }

    /// Advance to the first accepted document with id `>= target`.
    fn advance(&mut self, target: u64) -> Result<bool> {
        let mut target = target;
        loop {
            // The candidate is the smallest current document.
            let candidate = self
                .slots
                .iter()
                .map(|s| s.postings.doc_id())
                .min()
                .unwrap_or(doc_limits::EOF);
            if doc_limits::eof(candidate) {
                self.doc = doc_limits::EOF;
                return Ok(false);
            }
            if candidate < target {
                for slot in &mut self.slots {
                    if slot.postings.doc_id() < target {
                        slot.postings.seek(target)?;
                    }
                }
                continue;
            }

            let on_candidate = self
                .slots
                .iter()
                .filter(|s| s.postings.doc_id() == candidate)
                .count();
            if on_candidate >= self.min_match {
                let mut positions: Vec<&[u64]> = vec![&[]; self.total_slots];
                for slot in &self.slots {
                    if slot.postings.doc_id() == candidate {
                        positions[slot.index] = slot.postings.positions();
                    }
                }
                let matched = match_slots(&positions);
                if matched.len as usize >= self.min_match {
                    self.attributes = MatchAttributes {
                        frequency: matched.freq,
                        filter_boost: matched.len as f32 / self.total_slots as f32,
                    };
                    self.doc = candidate;
                    return Ok(true);
                }
            }

            target = candidate + 1;
        }
    }
}

impl Matcher for NgramSimilarityMatcher {
    fn doc_id(&self) -> u64 {
        self.doc
    }

    fn next(&mut self) -> Result<bool> {
        let target = if self.started {
            match self.doc {
                doc if doc_limits::eof(doc) => return Ok(false),
                doc => doc + 1,
            }
        } else {
            self.started = true;
            0
        };
        self.advance(target)
    }

    fn seek(&mut self, target: u64) -> Result<u64> {
        self.started = true;
        if !doc_limits::eof(self.doc) && self.doc >= target {
            return Ok(self.doc);
        }
        self.advance(target)?;
        Ok(self.doc)
    }

    fn cost(&self) -> u64 {
        self.cost
    }

    fn is_exhausted(&self) -> bool {
        self.started && doc_limits::eof(self.doc)
    }

    fn attributes(&self) -> &MatchAttributes {
        &self.attributes
    }
}
