//! Matchers: document cursors produced by query execution.

use std::fmt::Debug;

use crate::analysis::token::MatchAttributes;
use crate::error::Result;
use crate::index::postings::{doc_limits, PostingIterator};

/// A cursor over the documents matching a query within one segment.
///
/// Documents come out in strictly ascending id order. Matchers that score
/// publish per-document [`MatchAttributes`]; the rest return a static
/// default.
pub trait Matcher: Send + Debug {
    /// The current document id, [`doc_limits::EOF`] when exhausted or not
    /// yet positioned.
    fn doc_id(&self) -> u64;

    /// Move to the next matching document.
    fn next(&mut self) -> Result<bool>;

    /// Advance to the first matching document with id `>= target` and
    /// return it (or [`doc_limits::EOF`]).
    fn seek(&mut self, target: u64) -> Result<u64>;

    /// Estimated number of matching documents.
    fn cost(&self) -> u64;

    /// Check if this matcher is exhausted.
    fn is_exhausted(&self) -> bool;

    /// Scoring attributes of the current document.
    fn attributes(&self) -> &MatchAttributes {
        static DEFAULT: MatchAttributes = MatchAttributes {
            frequency: 0,
            filter_boost: 1.0,
        };
        &DEFAULT
    }
}

/// A matcher that matches no documents.
#[derive(Debug, Default)]
pub struct EmptyMatcher;

impl EmptyMatcher {
    /// Create a new empty matcher.
    pub fn new() -> Self {
        EmptyMatcher
    }
}

impl Matcher for EmptyMatcher {
    fn doc_id(&self) -> u64 {
        doc_limits::EOF
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

    fn is_exhausted(&self) -> bool {
        true
    }
}

/// A matcher over a single term's posting list.
///
/// The degenerate single-term form of the similarity filter: the match
/// frequency is the posting frequency and the filter boost is 1.
#[derive(Debug)]
pub struct PostingMatcher {
    postings: Box<dyn PostingIterator>,
    attributes: MatchAttributes,
}

impl PostingMatcher {
    /// Create a matcher over a posting iterator.
    pub fn new(postings: Box<dyn PostingIterator>) -> Self {
        PostingMatcher {
            postings,
            attributes: MatchAttributes::default(),
        }
    }

    fn refresh(&mut self) {
        self.attributes.frequency = self.postings.term_freq();
        self.attributes.filter_boost = 1.0;
    }
}

impl Matcher for PostingMatcher {
    fn doc_id(&self) -> u64 {
        self.postings.doc_id()
    }

    fn next(&mut self) -> Result<bool> {
        let advanced = self.postings.next()?;
        if advanced {
            self.refresh();
        }
        Ok(advanced)
    }

    fn seek(&mut self, target: u64) -> Result<u64> {
        let doc = self.postings.seek(target)?;
        if !doc_limits::eof(doc) {
            self.refresh();
        }
        Ok(doc)
    }

    fn cost(&self) -> u64 {
        self.postings.cost()
    }

    fn is_exhausted(&self) -> bool {
        doc_limits::eof(self.postings.doc_id())
    }

    fn attributes(&self) -> &MatchAttributes {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::postings::{MemoryPostingIterator, Posting};
    use std::sync::Arc;

    #[test]
    fn test_empty_matcher() {
        let mut matcher = EmptyMatcher::new();

        assert!(doc_limits::eof(matcher.doc_id()));
        assert!(matcher.is_exhausted());
        assert_eq!(matcher.cost(), 0);
        assert!(!matcher.next().unwrap());
        assert_eq!(matcher.seek(5).unwrap(), doc_limits::EOF);
        assert_eq!(matcher.attributes().filter_boost, 1.0);
    }

    #[test]
    fn test_posting_matcher() {
        let postings = Arc::new(vec![
            Posting {
                doc_id: 1,
                positions: vec![0, 3],
            },
            Posting {
                doc_id: 4,
                positions: vec![7],
            },
        ]);
        let mut matcher = PostingMatcher::new(Box::new(MemoryPostingIterator::new(postings)));

        assert_eq!(matcher.cost(), 2);
        assert!(matcher.next().unwrap());
        assert_eq!(matcher.doc_id(), 1);
        assert_eq!(matcher.attributes().frequency, 2);
        assert_eq!(matcher.attributes().filter_boost, 1.0);

        assert_eq!(matcher.seek(2).unwrap(), 4);
        assert_eq!(matcher.attributes().frequency, 1);

        assert!(!matcher.next().unwrap());
        assert!(matcher.is_exhausted());
    }
}
