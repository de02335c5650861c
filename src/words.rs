use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::WordSourceError;

static WORDLIST_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/wordlists");

/// An English word and its Japanese translation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WordPair {
    pub english: String,
    #[serde(default)]
    pub japanese: String,
}

impl WordPair {
    pub fn new(english: impl Into<String>, japanese: impl Into<String>) -> Self {
        Self {
            english: english.into(),
            japanese: japanese.into(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct WordFile {
    #[serde(default)]
    name: Option<String>,
    words: Vec<WordPair>,
}

/// Word lists compiled into the binary
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum WordList {
    Toeic,
    Basic,
}

impl WordList {
    fn file_name(&self) -> String {
        format!("{}.json", self.to_string().to_lowercase())
    }
}

/// Anything that can hand over the pool of words for a session.
pub trait WordSource: Send + 'static {
    fn fetch(&self) -> Result<Vec<WordPair>, WordSourceError>;
}

/// Reads one of the embedded word lists.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedWordSource {
    list: WordList,
}

impl EmbeddedWordSource {
    pub fn new(list: WordList) -> Self {
        Self { list }
    }
}

impl WordSource for EmbeddedWordSource {
    fn fetch(&self) -> Result<Vec<WordPair>, WordSourceError> {
        let file_name = self.list.file_name();
        let file = WORDLIST_DIR
            .get_file(&file_name)
            .ok_or_else(|| WordSourceError::Missing(file_name.clone()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| WordSourceError::Missing(file_name.clone()))?;
        parse_word_list(contents)
    }
}

/// Reads a word list from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileWordSource {
    path: PathBuf,
}

impl FileWordSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl WordSource for FileWordSource {
    fn fetch(&self) -> Result<Vec<WordPair>, WordSourceError> {
        if !self.path.exists() {
            return Err(WordSourceError::Missing(self.path.display().to_string()));
        }
        let contents = fs::read_to_string(&self.path)?;
        parse_word_list(&contents)
    }
}

/// Parses `{ "words": [{ "english": .., "japanese": .. }] }`, dropping
/// entries without an English word.
pub fn parse_word_list(json: &str) -> Result<Vec<WordPair>, WordSourceError> {
    let file: WordFile = serde_json::from_str(json)?;
    let total = file.words.len();

    let words: Vec<WordPair> = file
        .words
        .into_iter()
        .filter_map(|pair| {
            let english = pair.english.trim();
            if english.is_empty() {
                None
            } else {
                Some(WordPair::new(english, pair.japanese.trim()))
            }
        })
        .collect();

    if words.len() < total {
        warn!(
            "dropped {} word entries with an empty english field",
            total - words.len()
        );
    }
    if words.is_empty() {
        return Err(WordSourceError::Empty);
    }

    debug!(
        "parsed word list {} with {} words",
        file.name.as_deref().unwrap_or("<unnamed>"),
        words.len()
    );
    Ok(words)
}
