//! Process-wide cache of resolved text analyzer state.
//!
//! Resolving a text analyzer configuration means parsing the locale and
//! loading (possibly from disk) its stopword set; both are cached per
//! configuration key so repeated construction is cheap. Entries live for
//! the process lifetime. One mutex covers lookup and insertion; nothing is
//! held while an analyzer runs.

use std::sync::{Arc, OnceLock};

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::analysis::stopwords::StopwordMatcher;

/// Resolved state shared by every text analyzer built from the same
/// configuration.
#[derive(Debug)]
pub(crate) struct CachedState {
    pub language: String,
    pub stopwords: Arc<StopwordMatcher>,
}

type Cache = Mutex<AHashMap<String, Arc<CachedState>>>;

fn cache() -> &'static Cache {
    static CACHE: OnceLock<Cache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(AHashMap::new()))
}

/// Look up previously resolved state for a configuration key.
pub(crate) fn lookup(key: &str) -> Option<Arc<CachedState>> {
    cache().lock().get(key).cloned()
}

/// Insert resolved state for a configuration key.
///
/// When two threads race on the same key the first insertion wins and both
/// receive the same entry.
pub(crate) fn insert(key: &str, state: CachedState) -> Arc<CachedState> {
    cache()
        .lock()
        .entry(key.to_string())
        .or_insert_with(|| Arc::new(state))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_then_lookup() {
        let key = "test-cache-key-1";
        assert!(lookup(key).is_none());

        let inserted = insert(
            key,
            CachedState {
                language: "en".to_string(),
                stopwords: Arc::new(StopwordMatcher::from_words(["the"])),
            },
        );
        let found = lookup(key).unwrap();

        assert!(Arc::ptr_eq(&inserted, &found));
        assert_eq!(found.language, "en");
        assert!(found.stopwords.contains("the"));
    }

    #[test]
    fn test_first_insert_wins() {
        let key = "test-cache-key-2";
        let first = insert(
            key,
            CachedState {
                language: "en".to_string(),
                stopwords: Arc::new(StopwordMatcher::from_words(["a"])),
            },
        );
        let second = insert(
            key,
            CachedState {
                language: "de".to_string(),
                stopwords: Arc::new(StopwordMatcher::from_words(["b"])),
            },
        );

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.language, "en");
    }
}
