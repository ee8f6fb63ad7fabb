//! Delimiter analyzer: splits input on an exact delimiter string.

use log::error;
use serde::Deserialize;

use crate::analysis::analyzer::{Analyzer, MAX_INPUT_BYTES};
use crate::analysis::token::Token;

#[derive(Debug, Deserialize)]
struct DelimiterOptions {
    delimiter: String,
}

/// An analyzer that splits its input on an exact delimiter string.
///
/// Consecutive delimiters produce empty fields, which are emitted as empty
/// tokens so downstream analyzers observe every field position. An empty
/// delimiter yields the whole input as a single token.
///
/// # Examples
///
/// ```
/// use sagitta::analysis::analyzer::Analyzer;
/// use sagitta::analysis::delimiter::DelimiterAnalyzer;
///
/// let mut analyzer = DelimiterAnalyzer::new(",".to_string());
/// assert!(analyzer.reset("a,,b"));
///
/// let mut terms = Vec::new();
/// while analyzer.next() {
///     terms.push(analyzer.token().term.clone());
/// }
/// assert_eq!(terms, vec!["a", "", "b"]);
/// ```
#[derive(Debug)]
pub struct DelimiterAnalyzer {
    delimiter: String,
    input: String,
    cursor: usize,
    done: bool,
    token: Token,
}

impl DelimiterAnalyzer {
    /// Create a new delimiter analyzer.
    pub fn new(delimiter: String) -> Self {
        DelimiterAnalyzer {
            delimiter,
            input: String::new(),
            cursor: 0,
            done: true,
            token: Token::default(),
        }
    }

    /// Construct from a JSON options object: `{"delimiter": string}`.
    pub fn from_json(args: &str) -> Option<Self> {
        match serde_json::from_str::<DelimiterOptions>(args) {
            Ok(options) => Some(Self::new(options.delimiter)),
            Err(e) => {
                error!("invalid delimiter analyzer arguments {args:?}: {e}");
                None
            }
        }
    }

    /// Construct from a plain-text argument: the delimiter itself.
    pub fn from_text(args: &str) -> Option<Self> {
        Some(Self::new(args.to_string()))
    }
}

impl Analyzer for DelimiterAnalyzer {
    fn reset(&mut self, input: &str) -> bool {
        if input.len() > MAX_INPUT_BYTES {
            return false;
        }
        self.input.clear();
        self.input.push_str(input);
        self.cursor = 0;
        self.done = false;
        true
    }

    fn next(&mut self) -> bool {
        if self.done {
            return false;
        }

        if self.delimiter.is_empty() {
            // No delimiter: the whole input is one field.
            self.done = true;
            let end = self.input.len() as u32;
            let term = self.input.clone();
            self.token.set(&term, 0, end, 1);
            return true;
        }

        let start = self.cursor;
        let field_end = match self.input[start..].find(&self.delimiter) {
            Some(i) => {
                self.cursor = start + i + self.delimiter.len();
                start + i
            }
            None => {
                self.done = true;
                self.input.len()
            }
        };

        let term = self.input[start..field_end].to_string();
        self.token.set(&term, start as u32, field_end as u32, 1);
        true
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn name(&self) -> &'static str {
        "delimiter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(analyzer: &mut DelimiterAnalyzer, input: &str) -> Vec<(String, u32, u32, u32)> {
        assert!(analyzer.reset(input));
        let mut out = Vec::new();
        while analyzer.next() {
            let t = analyzer.token();
            out.push((t.term.clone(), t.start, t.end, t.increment));
        }
        out
    }

    #[test]
    fn test_basic_split() {
        let mut analyzer = DelimiterAnalyzer::new(",".to_string());
        let tokens = drain(&mut analyzer, "a,b,c");

        assert_eq!(
            tokens,
            vec![
                ("a".to_string(), 0, 1, 1),
                ("b".to_string(), 2, 3, 1),
                ("c".to_string(), 4, 5, 1),
            ]
        );
    }

    #[test]
    fn test_empty_fields() {
        let mut analyzer = DelimiterAnalyzer::new(",".to_string());
        let tokens = drain(&mut analyzer, "a,,b,");

        assert_eq!(
            tokens,
            vec![
                ("a".to_string(), 0, 1, 1),
                ("".to_string(), 2, 2, 1),
                ("b".to_string(), 3, 4, 1),
                ("".to_string(), 5, 5, 1),
            ]
        );
    }

    #[test]
    fn test_multi_byte_delimiter() {
        let mut analyzer = DelimiterAnalyzer::new("::".to_string());
        let tokens = drain(&mut analyzer, "a::bc");

        assert_eq!(
            tokens,
            vec![("a".to_string(), 0, 1, 1), ("bc".to_string(), 3, 5, 1)]
        );
    }

    #[test]
    fn test_empty_delimiter_keeps_input_whole() {
        let mut analyzer = DelimiterAnalyzer::new(String::new());
        let tokens = drain(&mut analyzer, "a,b");

        assert_eq!(tokens, vec![("a,b".to_string(), 0, 3, 1)]);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut analyzer = DelimiterAnalyzer::new(" ".to_string());
        let first = drain(&mut analyzer, "x y");
        let second = drain(&mut analyzer, "x y");
        assert_eq!(first, second);
    }

    #[test]
    fn test_from_json() {
        assert!(DelimiterAnalyzer::from_json(r#"{"delimiter":","}"#).is_some());
        assert!(DelimiterAnalyzer::from_json("not json").is_none());
        assert!(DelimiterAnalyzer::from_json("{}").is_none());
    }
}
