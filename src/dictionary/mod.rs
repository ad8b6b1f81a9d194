pub mod loader;

pub use loader::{DictionaryLoader, WordList, WordLoader};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A named, language-tagged pointer to a word list on disk.
///
/// Ordered by language, then name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dictionary {
    pub language: String,
    pub name: String,
    pub file_path: PathBuf,
}

impl Dictionary {
    pub fn new(
        name: impl Into<String>,
        language: impl Into<String>,
        file_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
            file_path: file_path.into(),
        }
    }
}

/// Lookup of available dictionaries.
pub trait DictionaryRepository: Send + Sync {
    fn get_all_dictionaries(&self) -> Result<Vec<Dictionary>>;

    fn get_dictionaries_by_language(&self, language: &str) -> Result<Vec<Dictionary>> {
        Ok(self
            .get_all_dictionaries()?
            .into_iter()
            .filter(|d| d.language == language)
            .collect())
    }

    fn get_dictionary_by_language_and_name(
        &self,
        language: &str,
        name: &str,
    ) -> Result<Option<Dictionary>> {
        Ok(self
            .get_dictionaries_by_language(language)?
            .into_iter()
            .find(|d| d.name == name))
    }
}

/// Dictionaries laid out on disk as `<root>/<language>/<name>.<ext>`.
#[derive(Debug, Clone)]
pub struct DirectoryDictionaryRepository {
    root: PathBuf,
}

impl DirectoryDictionaryRepository {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scan_language(&self, language: &str, dir: &Path) -> Result<Vec<Dictionary>> {
        let mut dictionaries: Vec<Dictionary> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if name.starts_with('.') || dictionaries.iter().any(|d| d.name == name) {
                continue;
            }
            dictionaries.push(Dictionary::new(name, language, path.clone()));
        }
        Ok(dictionaries)
    }
}

impl DictionaryRepository for DirectoryDictionaryRepository {
    fn get_all_dictionaries(&self) -> Result<Vec<Dictionary>> {
        if !self.root.is_dir() {
            tracing::debug!("dictionary root {} does not exist", self.root.display());
            return Ok(Vec::new());
        }

        let mut languages: Vec<(String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if let Some(language) = path.file_name().and_then(|s| s.to_str()) {
                if path.is_dir() && !language.starts_with('.') {
                    languages.push((language.to_string(), path.clone()));
                }
            }
        }

        let mut dictionaries = Vec::new();
        for (language, dir) in languages {
            dictionaries.extend(self.scan_language(&language, &dir)?);
        }
        dictionaries.sort();
        Ok(dictionaries)
    }

    fn get_dictionaries_by_language(&self, language: &str) -> Result<Vec<Dictionary>> {
        let dir = self.root.join(language);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut dictionaries = self.scan_language(language, &dir)?;
        dictionaries.sort();
        Ok(dictionaries)
    }
}

/// Fixed set of dictionaries held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDictionaryRepository {
    dictionaries: Vec<Dictionary>,
}

impl InMemoryDictionaryRepository {
    pub fn new(dictionaries: Vec<Dictionary>) -> Self {
        Self { dictionaries }
    }
}

impl DictionaryRepository for InMemoryDictionaryRepository {
    fn get_all_dictionaries(&self) -> Result<Vec<Dictionary>> {
        Ok(self.dictionaries.clone())
    }
}
