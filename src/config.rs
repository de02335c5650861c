use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::words::WordList;

/// Persisted user preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub word_list: WordList,
    pub words_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub show_translation: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            word_list: WordList::Toeic,
            words_path: None,
            db_path: None,
            show_translation: true,
        }
    }
}

/// Command line overrides layered on top of `Config`
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub word_list: Option<WordList>,
    pub words_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub hide_translation: bool,
    pub seed: Option<u64>,
}

/// Effective settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub word_list: WordList,
    pub words_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub show_translation: bool,
    pub seed: Option<u64>,
}

impl Settings {
    pub fn resolve(config: &Config, overrides: Overrides) -> Self {
        Self {
            word_list: overrides.word_list.unwrap_or(config.word_list),
            words_path: overrides.words_path.or_else(|| config.words_path.clone()),
            db_path: overrides
                .db_path
                .or_else(|| config.db_path.clone())
                .or_else(AppDirs::db_path),
            show_translation: config.show_translation && !overrides.hide_translation,
            seed: overrides.seed,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("tango_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!("ignoring unreadable config {}: {e}", self.path.display()),
            }
        }
        Config::default()
    }
}
