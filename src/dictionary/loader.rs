use super::Dictionary;
use crate::error::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// JSON word-list layout: `{"name": .., "size": .., "words": [..]}`.
#[derive(Deserialize, Clone, Debug)]
pub struct WordList {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u32,
    pub words: Vec<String>,
}

/// Source of raw words for a dictionary.
pub trait WordLoader: Send + Sync {
    fn load_words(&self, dictionary: &Dictionary) -> Vec<String>;
}

/// Reads word lists from disk and caches them by file path.
///
/// A path that loaded successfully is never read again by the same instance;
/// create a new loader to pick up changed files. Unreadable files yield an
/// empty list and a warning rather than an error.
#[derive(Debug, Default)]
pub struct DictionaryLoader {
    cache: Mutex<HashMap<PathBuf, Arc<Vec<String>>>>,
}

impl DictionaryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached_paths(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl WordLoader for DictionaryLoader {
    fn load_words(&self, dictionary: &Dictionary) -> Vec<String> {
        let path = &dictionary.file_path;
        if let Some(words) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return words.as_ref().clone();
        }

        match read_word_list(path) {
            Ok(words) => {
                tracing::debug!(
                    "loaded {} words for dictionary {}/{} from {}",
                    words.len(),
                    dictionary.language,
                    dictionary.name,
                    path.display()
                );
                let words = Arc::new(words);
                self.cache
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entry(path.clone())
                    .or_insert_with(|| Arc::clone(&words));
                words.as_ref().clone()
            }
            Err(e) => {
                tracing::warn!(
                    "failed to load dictionary {}/{} from {}: {}",
                    dictionary.language,
                    dictionary.name,
                    path.display(),
                    e
                );
                Vec::new()
            }
        }
    }
}

/// Read a word list; `.json` files use [`WordList`], anything else is split
/// on whitespace.
pub fn read_word_list(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let list: WordList = serde_json::from_str(&contents)?;
        Ok(list.words)
    } else {
        Ok(contents.split_whitespace().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_plain_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("common.txt");
        fs::write(&path, "the quick\nbrown  fox\n").unwrap();

        let loader = DictionaryLoader::new();
        let words = loader.load_words(&Dictionary::new("common", "english", &path));
        assert_eq!(words, vec!["the", "quick", "brown", "fox"]);
    }

    #[test]
    fn test_load_json_word_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("english.json");
        fs::write(
            &path,
            r#"{"name": "english", "size": 3, "words": ["hello", "world", "test"]}"#,
        )
        .unwrap();

        let loader = DictionaryLoader::new();
        let words = loader.load_words(&Dictionary::new("english", "english", &path));
        assert_eq!(words, vec!["hello", "world", "test"]);
    }

    #[test]
    fn test_cached_after_first_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("words.txt");
        fs::write(&path, "alpha beta").unwrap();
        let dictionary = Dictionary::new("words", "english", &path);

        let loader = DictionaryLoader::new();
        assert_eq!(loader.load_words(&dictionary), vec!["alpha", "beta"]);

        fs::write(&path, "gamma").unwrap();
        assert_eq!(loader.load_words(&dictionary), vec!["alpha", "beta"]);
        assert_eq!(loader.cached_paths(), 1);

        let fresh = DictionaryLoader::new();
        assert_eq!(fresh.load_words(&dictionary), vec!["gamma"]);
    }

    #[test]
    fn test_missing_file_yields_empty_and_is_not_cached() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("later.txt");
        let dictionary = Dictionary::new("later", "english", &path);

        let loader = DictionaryLoader::new();
        assert!(loader.load_words(&dictionary).is_empty());
        assert_eq!(loader.cached_paths(), 0);

        fs::write(&path, "now here").unwrap();
        assert_eq!(loader.load_words(&dictionary), vec!["now", "here"]);
    }

    #[test]
    fn test_malformed_json_yields_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let loader = DictionaryLoader::new();
        assert!(loader
            .load_words(&Dictionary::new("broken", "english", &path))
            .is_empty());
    }

    #[test]
    fn test_word_list_deserialization() {
        let json_data = r#"
        {
            "name": "test",
            "size": 3,
            "words": ["hello", "world", "test"]
        }
        "#;

        let list: WordList = serde_json::from_str(json_data).unwrap();
        assert_eq!(list.name, "test");
        assert_eq!(list.size, 3);
        assert_eq!(list.words.len(), 3);
    }
}
