//! Query execution: matchers, the similarity filter and scorers.

pub mod matcher;
pub mod ngram_similarity;
pub mod scorer;
pub mod sequence;

pub use matcher::{EmptyMatcher, Matcher, PostingMatcher};
pub use ngram_similarity::{NgramSimilarityFilter, PreparedNgramSimilarity};
pub use scorer::{collect, Bm25Scorer, QueryStats, ScoredDoc, Scorer, TfIdfScorer};
pub use sequence::{match_slots, SequenceMatch};
