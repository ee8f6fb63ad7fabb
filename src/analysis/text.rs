//! Text analyzer: locale-aware word segmentation and normalization.
//!
//! Splits input on UAX #29 word boundaries, then normalizes each word:
//! NFC, case conversion, accent folding, stopword removal and stemming.
//! Resolved locale state and stopword sets are cached process-wide per
//! configuration.

use std::sync::Arc;

use log::error;
use serde::Deserialize;
use unicode_normalization::{is_nfc, UnicodeNormalization};
use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::analyzer::{Analyzer, MAX_INPUT_BYTES};
use crate::analysis::cache::{self, CachedState};
use crate::analysis::norm::{fold_accents, CaseConvert};
use crate::analysis::stem::stem;
use crate::analysis::stopwords::{self, StopwordMatcher};
use crate::analysis::token::Token;

fn default_case() -> CaseConvert {
    CaseConvert::Lower
}

fn default_stemming() -> bool {
    true
}

fn default_accent() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct TextOptions {
    locale: String,
    #[serde(default = "default_case")]
    case: CaseConvert,
    #[serde(default)]
    stopwords: Option<Vec<String>>,
    #[serde(default)]
    stopwords_path: Option<String>,
    #[serde(default = "default_stemming")]
    stemming: bool,
    #[serde(default = "default_accent")]
    accent: bool,
}

/// Extract the ISO language code from a locale name such as `en_US.UTF-8`.
fn parse_language(locale: &str) -> Option<String> {
    let language: String = locale
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if language.is_empty() {
        None
    } else {
        Some(language.to_lowercase())
    }
}

/// A word-level analyzer for natural-language text.
///
/// # Examples
///
/// ```
/// use sagitta::analysis::analyzer::Analyzer;
/// use sagitta::analysis::text::TextAnalyzer;
///
/// let mut analyzer =
///     TextAnalyzer::from_json(r#"{"locale":"en", "stopwords":["the"]}"#).unwrap();
/// assert!(analyzer.reset("The quick fox jumps"));
///
/// let mut terms = Vec::new();
/// while analyzer.next() {
///     terms.push(analyzer.token().term.clone());
/// }
/// assert_eq!(terms, vec!["quick", "fox", "jump"]);
/// ```
#[derive(Debug)]
pub struct TextAnalyzer {
    language: String,
    case: CaseConvert,
    accent: bool,
    stemming: bool,
    stopwords: Arc<StopwordMatcher>,

    input: String,
    words: Vec<(u32, u32)>,
    cursor: usize,
    token: Token,
}

impl TextAnalyzer {
    /// Create a text analyzer from resolved parts.
    pub fn new(
        language: impl Into<String>,
        case: CaseConvert,
        accent: bool,
        stemming: bool,
        stopwords: Arc<StopwordMatcher>,
    ) -> Self {
        TextAnalyzer {
            language: language.into(),
            case,
            accent,
            stemming,
            stopwords,
            input: String::new(),
            words: Vec::new(),
            cursor: 0,
            token: Token::default(),
        }
    }

    /// Construct from a JSON options object; see the module docs for the
    /// recognized keys. The resolved locale and stopword state is cached
    /// process-wide under the full argument string.
    pub fn from_json(args: &str) -> Option<Self> {
        let options = match serde_json::from_str::<TextOptions>(args) {
            Ok(options) => options,
            Err(e) => {
                error!("invalid text analyzer arguments {args:?}: {e}");
                return None;
            }
        };
        Self::construct(args, &options)
    }

    /// Construct from a plain-text argument: the locale name, everything
    /// else defaulted.
    pub fn from_text(args: &str) -> Option<Self> {
        let options = TextOptions {
            locale: args.to_string(),
            case: default_case(),
            stopwords: None,
            stopwords_path: None,
            stemming: default_stemming(),
            accent: default_accent(),
        };
        Self::construct(args, &options)
    }

    fn construct(cache_key: &str, options: &TextOptions) -> Option<Self> {
        let state = match cache::lookup(cache_key) {
            Some(state) => state,
            None => {
                let language = match parse_language(&options.locale) {
                    Some(language) => language,
                    None => {
                        error!("unknown locale {:?} for text analyzer", options.locale);
                        return None;
                    }
                };
                let matcher = stopwords::build_matcher(
                    &language,
                    options.stopwords.as_deref(),
                    options.stopwords_path.as_deref(),
                )?;
                cache::insert(
                    cache_key,
                    CachedState {
                        language,
                        stopwords: Arc::new(matcher),
                    },
                )
            }
        };

        Some(Self::new(
            state.language.clone(),
            options.case,
            options.accent,
            options.stemming,
            state.stopwords.clone(),
        ))
    }

    /// The resolved ISO language code.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Normalize one word: NFC, case, accents, then the stem.
    fn process_term(&self, word: &str) -> String {
        let mut value = if is_nfc(word) {
            word.to_string()
        } else {
            word.nfc().collect()
        };
        value = self.case.apply(&value);
        if self.accent {
            value = fold_accents(&value);
        }
        if self.stemming && self.language == "en" {
            value = stem(&value);
        }
        value
    }
}

impl Analyzer for TextAnalyzer {
    fn reset(&mut self, input: &str) -> bool {
        if input.len() > MAX_INPUT_BYTES {
            return false;
        }
        self.input.clear();
        self.input.push_str(input);
        self.words.clear();
        self.words.extend(
            input
                .split_word_bound_indices()
                .filter(|(_, word)| word.chars().any(char::is_alphanumeric))
                .map(|(start, word)| (start as u32, (start + word.len()) as u32)),
        );
        self.cursor = 0;
        true
    }

    fn next(&mut self) -> bool {
        while self.cursor < self.words.len() {
            let (start, end) = self.words[self.cursor];
            self.cursor += 1;

            let value = self.process_term(&self.input[start as usize..end as usize]);
            if self.stopwords.contains(&value) {
                continue;
            }

            self.token.set(&value, start, end, 1);
            return true;
        }
        false
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn name(&self) -> &'static str {
        "text"
    }
}
