//! Ranking scorers consuming match frequency and filter boost.

use std::fmt::Debug;

use crate::error::Result;
use crate::index::reader::IndexReader;
use crate::query::ngram_similarity::PreparedNgramSimilarity;

/// Statistics gathered once during filter preparation, per query.
#[derive(Debug, Clone, Default)]
pub struct QueryStats {
    /// Total documents in the index.
    pub total_docs: u64,
    /// Documents carrying the searched field.
    pub field_docs: u64,
    /// Average field length in tokens.
    pub avg_field_length: f64,
    /// Document frequency per distinct present query term.
    pub term_doc_freqs: Vec<(String, u64)>,
}

/// A document scorer.
///
/// `freq` is the match frequency reported by the filter and `filter_boost`
/// its normalized match strength; both stand in for the usual positional
/// term frequency.
pub trait Scorer: Send + Debug {
    /// Score one document.
    fn score(&self, freq: u64, filter_boost: f32, doc_len: u64) -> f32;

    /// Get the boost factor of this scorer.
    fn boost(&self) -> f32;

    /// Set the boost factor of this scorer.
    fn set_boost(&mut self, boost: f32);

    /// Name of this scorer.
    fn name(&self) -> &'static str;
}

/// TF-IDF scorer with optional length normalization.
#[derive(Debug, Clone)]
pub struct TfIdfScorer {
    idf: f32,
    normalize: bool,
    boost: f32,
}

impl TfIdfScorer {
    /// Build from prepared query statistics.
    pub fn new(stats: &QueryStats, normalize: bool) -> Self {
        let n = stats.total_docs as f32;
        let idf = stats
            .term_doc_freqs
            .iter()
            .map(|(_, df)| 1.0 + (n / (*df as f32 + 1.0)).ln())
            .sum();
        TfIdfScorer {
            idf,
            normalize,
            boost: 1.0,
        }
    }

    fn tf(freq: u64) -> f32 {
        (freq as f32).sqrt()
    }
}

impl Scorer for TfIdfScorer {
    fn score(&self, freq: u64, filter_boost: f32, doc_len: u64) -> f32 {
        if freq == 0 {
            return 0.0;
        }
        let mut score = self.boost * filter_boost * Self::tf(freq) * self.idf;
        if self.normalize && doc_len > 0 {
            score /= (doc_len as f32).sqrt();
        }
        score
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    fn name(&self) -> &'static str {
        "tfidf"
    }
}

/// BM25 scorer; `b = 0` disables length normalization (BM15).
#[derive(Debug, Clone)]
pub struct Bm25Scorer {
    idf: f32,
    avg_field_length: f64,
    k1: f32,
    b: f32,
    boost: f32,
}

impl Bm25Scorer {
    /// Build from prepared query statistics with default parameters
    /// (`k1 = 1.2`, `b = 0.75`).
    pub fn new(stats: &QueryStats) -> Self {
        Self::with_params(stats, 1.2, 0.75)
    }

    /// Build with explicit `k1` and `b`.
    pub fn with_params(stats: &QueryStats, k1: f32, b: f32) -> Self {
        let n = stats.total_docs as f32;
        let idf = stats
            .term_doc_freqs
            .iter()
            .map(|(_, df)| {
                let df = *df as f32;
                (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
            })
            .sum();
        Bm25Scorer {
            idf,
            avg_field_length: stats.avg_field_length,
            k1,
            b,
            boost: 1.0,
        }
    }

    /// The k1 parameter.
    pub fn k1(&self) -> f32 {
        self.k1
    }

    /// The b parameter.
    pub fn b(&self) -> f32 {
        self.b
    }
}

impl Scorer for Bm25Scorer {
    fn score(&self, freq: u64, filter_boost: f32, doc_len: u64) -> f32 {
        if freq == 0 {
            return 0.0;
        }
        let freq = freq as f32;
        let norm = if self.avg_field_length > 0.0 {
            1.0 - self.b + self.b * (doc_len as f32 / self.avg_field_length as f32)
        } else {
            1.0
        };
        let tf = (freq * (self.k1 + 1.0)) / (freq + self.k1 * norm);
        self.boost * filter_boost * self.idf * tf
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    fn name(&self) -> &'static str {
        "bm25"
    }
}

/// One scored search hit. Document ids are `(segment ordinal, doc id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDoc {
    /// Ordinal of the segment within the reader.
    pub segment: usize,
    /// Document id within the segment.
    pub doc_id: u64,
    /// Computed score.
    pub score: f32,
}

/// Execute a prepared filter over every segment and rank the matches by
/// descending score.
pub fn collect(
    reader: &IndexReader,
    prepared: &PreparedNgramSimilarity,
    scorer: &dyn Scorer,
) -> Result<Vec<ScoredDoc>> {
    let mut hits = Vec::new();
    for (ordinal, segment) in reader.segments().iter().enumerate() {
        let mut docs = prepared.execute(segment)?;
        while docs.next()? {
            let attrs = docs.attributes();
            let doc_len = segment.doc_length(prepared.field(), docs.doc_id());
            let score =
                prepared.boost() * scorer.score(attrs.frequency, attrs.filter_boost, doc_len);
            hits.push(ScoredDoc {
                segment: ordinal,
                doc_id: docs.doc_id(),
                score,
            });
        }
    }

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.segment.cmp(&b.segment))
            .then(a.doc_id.cmp(&b.doc_id))
    });
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> QueryStats {
        QueryStats {
            total_docs: 100,
            field_docs: 100,
            avg_field_length: 10.0,
            term_doc_freqs: vec![("a".to_string(), 5), ("b".to_string(), 50)],
        }
    }

    #[test]
    fn test_tfidf_monotonic_in_freq_and_boost() {
        let scorer = TfIdfScorer::new(&stats(), false);

        assert_eq!(scorer.score(0, 1.0, 10), 0.0);
        let one = scorer.score(1, 1.0, 10);
        let four = scorer.score(4, 1.0, 10);
        assert!(four > one);
        assert!((four - 2.0 * one).abs() < 1e-5);

        let half = scorer.score(1, 0.5, 10);
        assert!((half - one * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_tfidf_normalization_penalizes_long_docs() {
        let scorer = TfIdfScorer::new(&stats(), true);
        assert!(scorer.score(1, 1.0, 4) > scorer.score(1, 1.0, 100));

        let unnormalized = TfIdfScorer::new(&stats(), false);
        assert_eq!(
            unnormalized.score(1, 1.0, 4),
            unnormalized.score(1, 1.0, 100)
        );
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let rare = QueryStats {
            term_doc_freqs: vec![("a".to_string(), 1)],
            ..stats()
        };
        let common = QueryStats {
            term_doc_freqs: vec![("a".to_string(), 90)],
            ..stats()
        };

        assert!(
            TfIdfScorer::new(&rare, false).score(1, 1.0, 10)
                > TfIdfScorer::new(&common, false).score(1, 1.0, 10)
        );
        assert!(
            Bm25Scorer::new(&rare).score(1, 1.0, 10)
                > Bm25Scorer::new(&common).score(1, 1.0, 10)
        );
    }

    #[test]
    fn test_bm25_length_normalization() {
        let scorer = Bm25Scorer::new(&stats());
        assert!(scorer.score(1, 1.0, 4) > scorer.score(1, 1.0, 40));

        // BM15: b = 0 removes the length dependency.
        let bm15 = Bm25Scorer::with_params(&stats(), 1.2, 0.0);
        assert_eq!(bm15.score(1, 1.0, 4), bm15.score(1, 1.0, 40));
        assert_eq!(bm15.b(), 0.0);
    }

    #[test]
    fn test_bm25_saturates_in_freq() {
        let scorer = Bm25Scorer::new(&stats());
        let s1 = scorer.score(1, 1.0, 10);
        let s10 = scorer.score(10, 1.0, 10);
        let s100 = scorer.score(100, 1.0, 10);

        assert!(s10 > s1);
        assert!(s100 > s10);
        // Saturation: the 10x freq jump gains less the second time.
        assert!(s100 - s10 < s10 - s1);
    }

    #[test]
    fn test_boost_applies() {
        let mut scorer = TfIdfScorer::new(&stats(), false);
        let base = scorer.score(1, 1.0, 10);
        scorer.set_boost(3.0);
        assert!((scorer.score(1, 1.0, 10) - 3.0 * base).abs() < 1e-5);
        assert_eq!(scorer.boost(), 3.0);
    }
}
