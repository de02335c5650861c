use chrono::{DateTime, Local};
use log::{debug, info};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

use crate::error::StoreError;

/// How many entries the leaderboard panel shows.
pub const LEADERBOARD_SIZE: usize = 10;

/// A score about to be written to the store
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub name: String,
    pub score: u32,
    pub timestamp: DateTime<Local>,
}

/// A stored score, as read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub id: String,
    pub name: String,
    pub score: u32,
    pub timestamp: DateTime<Local>,
}

/// Append-only score collection.
///
/// `top_n` returns at most `n` entries ordered by score descending; equal
/// scores keep the order in which the store accepted them.
pub trait LeaderboardStore: Send + Sync {
    fn append(&self, record: &ScoreRecord) -> Result<String, StoreError>;
    fn top_n(&self, n: usize) -> Result<Vec<LeaderboardEntry>, StoreError>;
}

/// SQLite-backed `scores` collection
#[derive(Debug)]
pub struct SqliteLeaderboard {
    conn: Mutex<Connection>,
}

impl SqliteLeaderboard {
    /// Open (or create) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        info!("opened leaderboard at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                score INTEGER NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_scores_score ON scores(score DESC, id ASC)",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl LeaderboardStore for SqliteLeaderboard {
    fn append(&self, record: &ScoreRecord) -> Result<String, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        conn.execute(
            "INSERT INTO scores (name, score, timestamp) VALUES (?1, ?2, ?3)",
            params![record.name, record.score, record.timestamp.to_rfc3339()],
        )?;

        let id = conn.last_insert_rowid().to_string();
        debug!("stored score {} for {} as {}", record.score, record.name, id);
        Ok(id)
    }

    fn top_n(&self, n: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, score, timestamp
            FROM scores
            ORDER BY score DESC, id ASC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([n as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, name, score, timestamp) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|_| StoreError::Timestamp(id.to_string()))?
                .with_timezone(&Local);
            entries.push(LeaderboardEntry {
                id: id.to_string(),
                name,
                score,
                timestamp,
            });
        }

        Ok(entries)
    }
}

/// In-process store, handy for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryLeaderboard {
    entries: Mutex<Vec<LeaderboardEntry>>,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LeaderboardStore for MemoryLeaderboard {
    fn append(&self, record: &ScoreRecord) -> Result<String, StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        let id = (entries.len() + 1).to_string();
        entries.push(LeaderboardEntry {
            id: id.clone(),
            name: record.name.clone(),
            score: record.score,
            timestamp: record.timestamp,
        });
        Ok(id)
    }

    fn top_n(&self, n: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        let mut sorted = entries.clone();
        // stable: equal scores stay in insert order
        sorted.sort_by(|a, b| b.score.cmp(&a.score));
        sorted.truncate(n);
        Ok(sorted)
    }
}
