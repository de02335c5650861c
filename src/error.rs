//! Error types shared across the game.

use thiserror::Error;

/// Failures while loading the word pool.
#[derive(Debug, Error)]
pub enum WordSourceError {
    #[error("failed to read word list: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse word list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("word list not found: {0}")]
    Missing(String),

    #[error("word list contains no usable words")]
    Empty,
}

/// Failures talking to the leaderboard store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid timestamp in row {0}")]
    Timestamp(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Reasons a score submission is refused or fails.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("the round has not finished")]
    NotFinished,

    #[error("player name is empty")]
    EmptyName,

    #[error("score was already submitted")]
    AlreadySubmitted,

    #[error("a submission is already in flight")]
    InFlight,

    /// `stored` tells whether the store still accepted the record.
    #[error("submission belongs to an earlier round")]
    Stale { stored: bool },

    #[error("failed to save score: {0}")]
    Store(#[from] StoreError),
}
