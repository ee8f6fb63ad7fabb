//! # Sagitta
//!
//! The core of a full-text search engine: analysis pipelines and an n-gram
//! similarity filter with its scoring iterator.
//!
//! ## Features
//!
//! - Composable analyzers (delimiter, ngram, norm, text) built by a factory
//!   registry from JSON or plain-text arguments
//! - Pipeline token streams: lazy cartesian composition with exact offset
//!   and position propagation
//! - Posting iterators over immutable in-memory segments
//! - N-gram similarity filtering: longest ordered subsequence matching with
//!   per-document frequency and filter boost
//! - TF-IDF and BM25/BM15 ranking over the filter's attributes
//! - Dense FST table matching for symbol-table lookups
//!
//! ## Example
//!
//! ```
//! use sagitta::analysis::{analyzer, TextFormat};
//! use sagitta::index::{IndexReader, MemorySegment};
//! use sagitta::query::NgramSimilarityFilter;
//!
//! // Index a couple of documents as 2-gram streams.
//! let mut ngram = analyzer("ngram", TextFormat::Json, r#"{"min":2, "max":2}"#).unwrap();
//! let mut writer = MemorySegment::writer();
//! writer.add_analyzed("body", "quick", ngram.as_mut()).unwrap();
//! writer.add_analyzed("body", "quack", ngram.as_mut()).unwrap();
//! let reader = IndexReader::from(writer.finish());
//!
//! // Find documents similar to "quick".
//! let filter = NgramSimilarityFilter::new("body")
//!     .threshold(0.5)
//!     .terms(["qu", "ui", "ic", "ck"]);
//! let prepared = filter.prepare(&reader).unwrap();
//!
//! let mut docs = prepared.execute(&reader.segments()[0]).unwrap();
//! assert!(docs.next().unwrap());
//! assert_eq!(docs.doc_id(), 0);
//! assert_eq!(docs.attributes().filter_boost, 1.0);
//! assert!(docs.next().unwrap());
//! assert_eq!(docs.doc_id(), 1); // "quack" shares qu and ck
//! assert_eq!(docs.attributes().filter_boost, 0.5);
//! ```

pub mod analysis;
pub mod error;
pub mod index;
pub mod query;
pub mod util;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
