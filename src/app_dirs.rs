use directories::ProjectDirs;
use std::env;
use std::path::PathBuf;

const APP: &str = "typist";

/// Where typist keeps its files when nothing else is configured.
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP)
    }

    pub fn config_path() -> PathBuf {
        Self::project()
            .map(|dirs| dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("typist_config.json"))
    }

    /// `$XDG_STATE_HOME/typist/typist.db`, then `~/.local/state/typist/typist.db`.
    pub fn db_path() -> PathBuf {
        let state_home = env::var_os("XDG_STATE_HOME")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/state")));
        match state_home {
            Some(dir) => dir.join(APP).join("typist.db"),
            None => Self::project()
                .map(|dirs| dirs.data_local_dir().join("typist.db"))
                .unwrap_or_else(|| PathBuf::from("typist.db")),
        }
    }

    pub fn dictionary_dir() -> PathBuf {
        Self::project()
            .map(|dirs| dirs.data_dir().join("dictionaries"))
            .unwrap_or_else(|| PathBuf::from("dictionaries"))
    }
}
