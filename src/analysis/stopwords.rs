//! Stopword loading and matching.
//!
//! Stopword sets are compiled into an fst automaton once and membership is
//! checked through the dense table matcher, so the per-token cost of the
//! text analyzer stays flat regardless of set size.

use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use ahash::AHashSet;
use log::warn;

use crate::error::{Result, SagittaError};
use crate::util::table_matcher::{DenseFsa, Label, TableMatcher, NO_STATE};

/// Environment variable pointing at the stopword directory root.
pub const STOPWORD_PATH_ENV_VARIABLE: &str = "SAGITTA_STOPWORD_PATH";

/// Resolve the stopword root directory: an explicit path wins over the
/// environment variable, which wins over the current directory. Relative
/// paths resolve against the current directory.
pub fn resolve_root(explicit: Option<&str>) -> PathBuf {
    let root = explicit
        .map(PathBuf::from)
        .or_else(|| env::var(STOPWORD_PATH_ENV_VARIABLE).ok().map(PathBuf::from))
        .unwrap_or_default();

    if root.is_absolute() {
        root
    } else {
        env::current_dir().unwrap_or_default().join(root)
    }
}

/// Load the merged stopword set for `language` from `root`.
///
/// The directory `root/language` must exist; every regular file in it
/// contributes one word per line. A word is the prefix before the first
/// whitespace character; lines starting with whitespace are skipped.
pub fn load_stopwords(root: &Path, language: &str) -> Result<AHashSet<String>> {
    let dir = root.join(language);
    if !dir.is_dir() {
        return Err(SagittaError::other(format!(
            "stopword directory not found: {}",
            dir.display()
        )));
    }

    let mut words = AHashSet::new();
    for entry in dir.read_dir()? {
        let path = entry?.path();
        if path.is_dir() {
            continue;
        }
        let reader = BufReader::new(File::open(&path)?);
        for line in reader.lines() {
            let line = line?;
            let end = line
                .find(|c: char| c.is_whitespace())
                .unwrap_or(line.len());
            if end > 0 {
                words.insert(line[..end].to_string());
            }
        }
    }

    Ok(words)
}

/// Rho label for word tables: stopword automata carry no fallback arcs, so
/// the sentinel simply never matches.
const WORD_RHO: Label = u32::MAX;

/// An immutable stopword set matched byte-by-byte through the table matcher.
#[derive(Debug, Clone)]
pub struct StopwordMatcher {
    table: TableMatcher<WORD_RHO, 256>,
    len: usize,
}

impl StopwordMatcher {
    /// Compile a word set into a matcher.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sorted: Vec<Vec<u8>> = words
            .into_iter()
            .map(|w| w.as_ref().as_bytes().to_vec())
            .collect();
        sorted.sort();
        sorted.dedup();
        let len = sorted.len();

        // Building from sorted keys cannot fail.
        let set = fst::Set::from_iter(sorted).expect("sorted stopword keys");
        let fsa = DenseFsa::from_fst(set.as_fst());

        StopwordMatcher {
            table: TableMatcher::new(&fsa),
            len,
        }
    }

    /// Check whether `word` is in the set.
    pub fn contains(&self, word: &str) -> bool {
        let mut state = self.table.start();
        for byte in word.bytes() {
            state = self.table.transition(state, byte as Label);
            if state == NO_STATE {
                return false;
            }
        }
        !word.is_empty() && self.table.is_final(state)
    }

    /// Number of words in the set.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Load and compile the stopword set for a text analyzer configuration.
///
/// `explicit` words are always included; when `path` is given (or neither
/// list nor path is), the language directory is loaded and merged in.
pub fn build_matcher(
    language: &str,
    explicit: Option<&[String]>,
    path: Option<&str>,
) -> Option<StopwordMatcher> {
    let mut words: AHashSet<String> = explicit
        .map(|w| w.iter().cloned().collect())
        .unwrap_or_default();

    if explicit.is_none() || path.is_some() {
        let root = resolve_root(path);
        match load_stopwords(&root, language) {
            Ok(loaded) => words.extend(loaded),
            Err(e) => {
                warn!("failed to load stopwords for language {language:?}: {e}");
                return None;
            }
        }
    }

    Some(StopwordMatcher::from_words(words))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_matcher_membership() {
        let matcher = StopwordMatcher::from_words(["and", "the", "ant"]);

        assert_eq!(matcher.len(), 3);
        assert!(matcher.contains("and"));
        assert!(matcher.contains("the"));
        assert!(matcher.contains("ant"));
        assert!(!matcher.contains("an"));
        assert!(!matcher.contains("thee"));
        assert!(!matcher.contains(""));
    }

    #[test]
    fn test_empty_matcher() {
        let matcher = StopwordMatcher::from_words(Vec::<String>::new());
        assert!(matcher.is_empty());
        assert!(!matcher.contains("and"));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let lang_dir = dir.path().join("en");
        std::fs::create_dir(&lang_dir).unwrap();

        let mut file = File::create(lang_dir.join("words.txt")).unwrap();
        writeln!(file, "and").unwrap();
        writeln!(file, "the\tcomment after tab").unwrap();
        writeln!(file, " leading whitespace is skipped").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "or").unwrap();
        drop(file);

        let words = load_stopwords(dir.path(), "en").unwrap();
        assert_eq!(words.len(), 3);
        assert!(words.contains("and"));
        assert!(words.contains("the"));
        assert!(words.contains("or"));
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_stopwords(dir.path(), "xx").is_err());
    }

    #[test]
    fn test_explicit_words_skip_directory() {
        let matcher = build_matcher("en", Some(&["a".to_string()]), None).unwrap();
        assert!(matcher.contains("a"));
        assert!(!matcher.contains("b"));
    }
}
