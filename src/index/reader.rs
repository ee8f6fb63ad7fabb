//! Index reader: a collection of immutable segments.

use std::sync::Arc;

use crate::index::segment::SegmentReader;

/// Read access to an index as an ordered list of segments.
///
/// Segments are independent; document ids are per-segment and matchers
/// emit ascending ids within a segment only.
///
/// # Examples
///
/// ```
/// use sagitta::index::reader::IndexReader;
/// use sagitta::index::segment::MemorySegment;
///
/// let mut writer = MemorySegment::writer();
/// writer.add_tokens("body", &["fox"]);
///
/// let reader = IndexReader::from(writer.finish());
/// assert_eq!(reader.doc_count(), 1);
/// assert_eq!(reader.segments().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct IndexReader {
    segments: Vec<Arc<dyn SegmentReader>>,
}

impl IndexReader {
    /// Create a reader over `segments`.
    pub fn new(segments: Vec<Arc<dyn SegmentReader>>) -> Self {
        IndexReader { segments }
    }

    /// The segments of this index, in order.
    pub fn segments(&self) -> &[Arc<dyn SegmentReader>] {
        &self.segments
    }

    /// Total number of documents across segments.
    pub fn doc_count(&self) -> u64 {
        self.segments.iter().map(|s| s.doc_count()).sum()
    }
}

impl<S: SegmentReader + 'static> From<S> for IndexReader {
    fn from(segment: S) -> Self {
        IndexReader::new(vec![Arc::new(segment)])
    }
}
