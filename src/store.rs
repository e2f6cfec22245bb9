use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::app_dirs::AppDirs;
use crate::backend::ResultSink;

/// Number of rows the leaderboard shows
pub const LEADERBOARD_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// One saved result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreEntry {
    pub player: String,
    pub score: u32,
    pub recorded_at: DateTime<Local>,
}

impl ScoreEntry {
    /// Date as shown on the leaderboard, e.g. `07/03/2025`
    pub fn display_date(&self) -> String {
        self.recorded_at.format("%d/%m/%Y").to_string()
    }
}

/// SQLite-backed score table
#[derive(Debug)]
pub struct ScoreDb {
    conn: Mutex<Connection>,
}

impl ScoreDb {
    /// Open the database at the default state location
    pub fn new() -> Result<Self, StoreError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("bughunt_scores.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player TEXT NOT NULL,
                score INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_scores_score ON scores(score)",
            [],
        )?;

        Ok(ScoreDb {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("score database lock poisoned".into()))
    }

    pub fn record(&self, player: &str, score: u32, at: DateTime<Local>) -> Result<(), StoreError> {
        self.lock()?.execute(
            "INSERT INTO scores (player, score, recorded_at) VALUES (?1, ?2, ?3)",
            params![player, score, at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Highest scores first; equal scores keep the earlier result on top
    pub fn top_scores(&self, limit: usize) -> Result<Vec<ScoreEntry>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT player, score, recorded_at
            FROM scores
            ORDER BY score DESC, recorded_at ASC, id ASC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let recorded_at: String = row.get(2)?;
            let recorded_at = DateTime::parse_from_rfc3339(&recorded_at)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        2,
                        "recorded_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(ScoreEntry {
                player: row.get(0)?,
                score: row.get(1)?,
                recorded_at,
            })
        })?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }

    pub fn best_score(&self, player: &str) -> Result<Option<u32>, StoreError> {
        let best = self.lock()?.query_row(
            "SELECT MAX(score) FROM scores WHERE player = ?1",
            [player],
            |row| row.get::<_, Option<u32>>(0),
        )?;
        Ok(best)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM scores", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl ResultSink for ScoreDb {
    fn submit_result(&self, score: u32, player: &str) -> Result<(), StoreError> {
        self.record(player, score, Local::now())
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    rank: usize,
    player: &'a str,
    score: u32,
    date: String,
}

/// Write leaderboard rows as CSV with a header line
pub fn write_csv<W: std::io::Write>(entries: &[ScoreEntry], out: W) -> Result<(), StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    // header goes out even when there are no rows
    writer.write_record(["rank", "player", "score", "date"])?;
    for (i, e) in entries.iter().enumerate() {
        writer.serialize(CsvRow {
            rank: i + 1,
            player: &e.player,
            score: e.score,
            date: e.recorded_at.to_rfc3339(),
        })?;
    }
    writer.flush()?;
    Ok(())
}
