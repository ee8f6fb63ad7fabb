//! Core analyzer trait definition.

use crate::analysis::token::{AttributeSet, Token};

/// Maximum input size accepted by `reset`, in bytes.
///
/// Kept at the 32-bit signed limit so inputs round-trip through offset
/// attributes without truncation.
pub const MAX_INPUT_BYTES: usize = i32::MAX as usize;

/// A stateful cursor transforming input text into a stream of tokens.
///
/// The contract is `reset(input)` followed by repeated `next()`; while
/// `next()` returns `true` the current token is readable via [`token`].
/// Analyzers are reused across inputs by calling `reset` again, and draining
/// the same input twice yields the same tokens.
///
/// [`token`]: Analyzer::token
///
/// # Examples
///
/// ```
/// use sagitta::analysis::analyzer::Analyzer;
/// use sagitta::analysis::delimiter::DelimiterAnalyzer;
///
/// let mut analyzer = DelimiterAnalyzer::new(",".to_string());
/// assert!(analyzer.reset("a,b"));
///
/// let mut terms = Vec::new();
/// while analyzer.next() {
///     terms.push(analyzer.token().term.clone());
/// }
/// assert_eq!(terms, vec!["a", "b"]);
/// ```
pub trait Analyzer: Send {
    /// Declare which attributes this analyzer produces.
    fn attributes(&self) -> AttributeSet {
        AttributeSet::TOKEN
    }

    /// Bind new input. Returns `false` when the analyzer is mis-configured
    /// or the input exceeds [`MAX_INPUT_BYTES`].
    fn reset(&mut self, input: &str) -> bool;

    /// Advance to the next token. Returns `false` at end of stream.
    fn next(&mut self) -> bool;

    /// The current token. Only meaningful after `next()` returned `true`.
    fn token(&self) -> &Token;

    /// Name of this analyzer (for debugging and configuration).
    fn name(&self) -> &'static str;
}
