//! Persistent defaults for the command line.

use crate::app_dirs::AppDirs;
use crate::composer::DEFAULT_WORD_COUNT;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Root of `<language>/<name>.<ext>` word lists.
    pub dictionary_dir: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub language: String,
    pub number_of_words: usize,
    pub time_limit_secs: Option<u32>,
    pub modifiers: Vec<String>,
    /// Local profile, created on first use.
    pub profile_id: Option<Uuid>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dictionary_dir: None,
            database_path: None,
            language: "english".to_string(),
            number_of_words: DEFAULT_WORD_COUNT,
            time_limit_secs: None,
            modifiers: Vec::new(),
            profile_id: None,
        }
    }
}

impl Config {
    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(AppDirs::db_path)
    }

    pub fn dictionary_dir(&self) -> PathBuf {
        self.dictionary_dir
            .clone()
            .unwrap_or_else(AppDirs::dictionary_dir)
    }
}

pub trait ConfigStore {
    /// Never fails; unreadable config yields the defaults.
    fn load(&self) -> Config;
    fn save(&self, config: &Config) -> Result<()>;
}

/// JSON config file, by default in the platform config directory.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::with_path(AppDirs::config_path())
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("no config read from {}: {}", self.path.display(), e);
                return Config::default();
            }
        };
        serde_json::from_slice(&raw).unwrap_or_else(|e| {
            tracing::warn!("ignoring invalid config {}: {}", self.path.display(), e);
            Config::default()
        })
    }

    fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(config)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn saved_config_loads_back() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let cfg = Config {
            dictionary_dir: Some(dir.path().join("dicts")),
            database_path: Some(dir.path().join("typist.db")),
            language: "italian".into(),
            number_of_words: 50,
            time_limit_secs: Some(60),
            modifiers: vec!["capitalize".into(), "addSuffix(.)".into()],
            profile_id: Some(Uuid::new_v4()),
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_or_corrupt_config_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, "{ nope").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"number_of_words": 40}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.number_of_words, 40);
        assert_eq!(cfg.language, "english");
        assert!(cfg.modifiers.is_empty());
        assert_eq!(cfg.profile_id, None);
    }

    #[test]
    fn configured_paths_take_precedence() {
        let cfg = Config {
            database_path: Some(PathBuf::from("/tmp/t.db")),
            dictionary_dir: Some(PathBuf::from("/tmp/words")),
            ..Config::default()
        };
        assert_eq!(cfg.database_path(), PathBuf::from("/tmp/t.db"));
        assert_eq!(cfg.dictionary_dir(), PathBuf::from("/tmp/words"));
        assert!(Config::default().database_path().ends_with("typist.db"));
    }
}
