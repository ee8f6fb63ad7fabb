//! Text analysis: analyzers, pipelines and the factory registry.
//!
//! An [`Analyzer`](analyzer::Analyzer) is a stateful cursor over one input;
//! [`PipelineAnalyzer`](pipeline::PipelineAnalyzer) composes several into a
//! cartesian stream. Analyzers are usually constructed by name through
//! [`registry::analyzer`].

pub mod analyzer;
pub mod cache;
pub mod delimiter;
pub mod ngram;
pub mod norm;
pub mod pipeline;
pub mod registry;
pub mod stem;
pub mod stopwords;
pub mod text;
pub mod token;

pub use analyzer::Analyzer;
pub use pipeline::PipelineAnalyzer;
pub use registry::{analyzer, AnalyzerRegistry, TextFormat};
pub use token::{AttributeSet, MatchAttributes, Token};
