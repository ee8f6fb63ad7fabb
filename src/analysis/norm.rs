//! Norm analyzer: whole-input case and accent normalization.

use log::error;
use serde::Deserialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::analysis::analyzer::{Analyzer, MAX_INPUT_BYTES};
use crate::analysis::token::Token;

/// Case conversion applied by normalizing analyzers.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaseConvert {
    /// Convert to lower case.
    Lower,
    /// Convert to upper case.
    Upper,
    /// Leave the value as-is.
    #[default]
    None,
}

impl CaseConvert {
    /// Apply this conversion to a value.
    pub fn apply(&self, value: &str) -> String {
        match self {
            CaseConvert::Lower => value.to_lowercase(),
            CaseConvert::Upper => value.to_uppercase(),
            CaseConvert::None => value.to_string(),
        }
    }
}

/// Strip diacritics: decompose, drop combining marks, recompose.
pub(crate) fn fold_accents(value: &str) -> String {
    value.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

fn default_accent() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct NormOptions {
    locale: String,
    #[serde(default)]
    case: CaseConvert,
    #[serde(default = "default_accent")]
    accent: bool,
}

/// An analyzer that emits its whole input as a single normalized token.
///
/// # Examples
///
/// ```
/// use sagitta::analysis::analyzer::Analyzer;
/// use sagitta::analysis::norm::{CaseConvert, NormAnalyzer};
///
/// let mut analyzer = NormAnalyzer::new(CaseConvert::Lower, true);
/// assert!(analyzer.reset("QuIck"));
/// assert!(analyzer.next());
/// assert_eq!(analyzer.token().term, "quick");
/// assert!(!analyzer.next());
/// ```
#[derive(Debug)]
pub struct NormAnalyzer {
    case: CaseConvert,
    accent: bool,
    input: String,
    done: bool,
    token: Token,
}

impl NormAnalyzer {
    /// Create a new norm analyzer.
    pub fn new(case: CaseConvert, accent: bool) -> Self {
        NormAnalyzer {
            case,
            accent,
            input: String::new(),
            done: true,
            token: Token::default(),
        }
    }

    /// Construct from a JSON options object:
    /// `{"locale": string, "case": "lower"|"upper"|"none", "accent": bool}`.
    pub fn from_json(args: &str) -> Option<Self> {
        match serde_json::from_str::<NormOptions>(args) {
            Ok(options) => {
                if options.locale.is_empty() {
                    error!("norm analyzer requires a non-empty locale");
                    return None;
                }
                Some(Self::new(options.case, options.accent))
            }
            Err(e) => {
                error!("invalid norm analyzer arguments {args:?}: {e}");
                None
            }
        }
    }
}

impl Analyzer for NormAnalyzer {
    fn reset(&mut self, input: &str) -> bool {
        if input.len() > MAX_INPUT_BYTES {
            return false;
        }
        self.input.clear();
        self.input.push_str(input);
        self.done = false;
        true
    }

    fn next(&mut self) -> bool {
        if self.done {
            return false;
        }
        self.done = true;

        let mut value = self.case.apply(&self.input);
        if self.accent {
            value = fold_accents(&value);
        }
        let end = self.input.len() as u32;
        self.token.set(&value, 0, end, 1);
        true
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn name(&self) -> &'static str {
        "norm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase() {
        let mut analyzer = NormAnalyzer::new(CaseConvert::Lower, false);
        assert!(analyzer.reset("QuIck"));
        assert!(analyzer.next());

        let token = analyzer.token();
        assert_eq!(token.term, "quick");
        assert_eq!((token.start, token.end), (0, 5));
        assert_eq!(token.increment, 1);
        assert!(!analyzer.next());
    }

    #[test]
    fn test_uppercase() {
        let mut analyzer = NormAnalyzer::new(CaseConvert::Upper, false);
        assert!(analyzer.reset("QuIck"));
        assert!(analyzer.next());
        assert_eq!(analyzer.token().term, "QUICK");
    }

    #[test]
    fn test_case_none_keeps_value() {
        let mut analyzer = NormAnalyzer::new(CaseConvert::None, false);
        assert!(analyzer.reset("QuIck"));
        assert!(analyzer.next());
        assert_eq!(analyzer.token().term, "QuIck");
    }

    #[test]
    fn test_accent_folding() {
        let mut analyzer = NormAnalyzer::new(CaseConvert::Lower, true);
        assert!(analyzer.reset("Café"));
        assert!(analyzer.next());

        let token = analyzer.token();
        assert_eq!(token.term, "cafe");
        // Offsets cover the original input, which is longer in bytes.
        assert_eq!((token.start, token.end), (0, 5));
    }

    #[test]
    fn test_from_json() {
        assert!(NormAnalyzer::from_json(r#"{"locale":"en", "case":"upper"}"#).is_some());
        assert!(NormAnalyzer::from_json(r#"{"locale":"en"}"#).is_some());
        assert!(NormAnalyzer::from_json(r#"{"case":"upper"}"#).is_none());
        assert!(NormAnalyzer::from_json("nope").is_none());
    }
}
