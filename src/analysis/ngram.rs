//! N-gram analyzer: character n-grams with byte offsets.

use log::error;
use serde::Deserialize;

use crate::analysis::analyzer::{Analyzer, MAX_INPUT_BYTES};
use crate::analysis::token::Token;

fn default_preserve_original() -> bool {
    false
}

#[derive(Debug, Deserialize)]
struct NgramOptions {
    min: usize,
    max: usize,
    #[serde(rename = "preserveOriginal", default = "default_preserve_original")]
    preserve_original: bool,
}

/// An analyzer that generates character n-grams.
///
/// For each start position it emits the grams of length `min..=max` that
/// fit, the first gram at a start with increment 1 and the rest overlaying
/// it with increment 0. With `preserve_original`, the whole input is also
/// emitted at the first position unless its length already falls inside
/// `[min, max]` (where the full-length gram covers it).
///
/// Grams are aligned to character boundaries; offsets are byte ranges into
/// the input.
///
/// # Examples
///
/// ```
/// use sagitta::analysis::analyzer::Analyzer;
/// use sagitta::analysis::ngram::NgramAnalyzer;
///
/// let mut analyzer = NgramAnalyzer::new(2, 2, false).unwrap();
/// assert!(analyzer.reset("abc"));
///
/// let mut terms = Vec::new();
/// while analyzer.next() {
///     terms.push(analyzer.token().term.clone());
/// }
/// assert_eq!(terms, vec!["ab", "bc"]);
/// ```
#[derive(Debug)]
pub struct NgramAnalyzer {
    min: usize,
    max: usize,
    preserve_original: bool,

    input: String,
    /// Byte offset of every char boundary, including the trailing one.
    char_starts: Vec<u32>,
    start: usize,
    len: usize,
    original_pending: bool,
    emitted_any: bool,
    token: Token,
}

impl NgramAnalyzer {
    /// Create a new n-gram analyzer. `min` must be at least 1 and `max` at
    /// least `min`.
    pub fn new(min: usize, max: usize, preserve_original: bool) -> Option<Self> {
        if min == 0 || max < min {
            error!("invalid ngram bounds: min={min}, max={max}");
            return None;
        }
        Some(NgramAnalyzer {
            min,
            max,
            preserve_original,
            input: String::new(),
            char_starts: Vec::new(),
            start: 0,
            len: min,
            original_pending: false,
            emitted_any: false,
            token: Token::default(),
        })
    }

    /// Construct from a JSON options object:
    /// `{"min": int, "max": int, "preserveOriginal": bool}`.
    pub fn from_json(args: &str) -> Option<Self> {
        match serde_json::from_str::<NgramOptions>(args) {
            Ok(options) => Self::new(options.min, options.max, options.preserve_original),
            Err(e) => {
                error!("invalid ngram analyzer arguments {args:?}: {e}");
                None
            }
        }
    }

    fn char_count(&self) -> usize {
        self.char_starts.len().saturating_sub(1)
    }

    fn emit_gram(&mut self) {
        let from = self.char_starts[self.start] as usize;
        let to = self.char_starts[self.start + self.len] as usize;
        let increment = u32::from(self.len == self.min);
        let term = self.input[from..to].to_string();
        self.token.set(&term, from as u32, to as u32, increment);
    }

    fn emit_original(&mut self) {
        let increment = u32::from(!self.emitted_any);
        let term = self.input.clone();
        let end = self.input.len() as u32;
        self.token.set(&term, 0, end, increment);
    }
}

impl Analyzer for NgramAnalyzer {
    fn reset(&mut self, input: &str) -> bool {
        if input.len() > MAX_INPUT_BYTES {
            return false;
        }
        self.input.clear();
        self.input.push_str(input);
        self.char_starts.clear();
        self.char_starts
            .extend(input.char_indices().map(|(i, _)| i as u32));
        self.char_starts.push(input.len() as u32);
        self.start = 0;
        self.len = self.min;
        self.emitted_any = false;
        let nchars = self.char_count();
        self.original_pending =
            self.preserve_original && nchars > 0 && !(self.min..=self.max).contains(&nchars);
        true
    }

    fn next(&mut self) -> bool {
        let nchars = self.char_count();
        loop {
            if self.start + self.min > nchars {
                // No more grams fit anywhere. The original is still owed
                // when no gram was ever produced.
                if self.original_pending {
                    self.original_pending = false;
                    self.emit_original();
                    self.emitted_any = true;
                    return true;
                }
                return false;
            }

            if self.len <= self.max && self.start + self.len <= nchars {
                self.emit_gram();
                self.len += 1;
                self.emitted_any = true;
                return true;
            }

            // Grams at this start are exhausted; the preserved original
            // overlays the first position before moving on.
            if self.start == 0 && self.original_pending {
                self.original_pending = false;
                self.emit_original();
                return true;
            }

            self.start += 1;
            self.len = self.min;
        }
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn name(&self) -> &'static str {
        "ngram"
    }
}
