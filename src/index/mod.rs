//! Inverted index access: posting iterators, segments and readers.

pub mod postings;
pub mod reader;
pub mod segment;

pub use postings::{doc_limits, EmptyPostingIterator, MemoryPostingIterator, Posting, PostingIterator};
pub use reader::IndexReader;
pub use segment::{FieldStats, MemorySegment, MemorySegmentWriter, SegmentReader, TermInfo};
