use crate::analytics::SessionRecord;
use crate::app_dirs::AppDirs;
use crate::error::{Error, Result};
use crate::quiz::ComprehensionResult;
use crate::session::{ReadingMode, ReadingSession};
use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use std::io;
use std::path::PathBuf;

/// Session history store backed by SQLite.
///
/// Holds one row per reading session (inserted open, updated exactly once
/// at completion) and at most one comprehension result per session.
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open (creating if needed) the history database in the app state dir
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("lectio_history.db"));
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&db_path)?;
        Self::init_schema(&conn)?;
        Ok(HistoryDb { conn })
    }

    /// Private database for tests and throwaway runs
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(HistoryDb { conn })
    }

    fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mode TEXT NOT NULL,
                pace_wpm INTEGER NOT NULL,
                chunk_size INTEGER,
                passage_title TEXT NOT NULL,
                total_words INTEGER NOT NULL,
                started_at TEXT NOT NULL,
                ended_at TEXT,
                duration_ms INTEGER NOT NULL DEFAULT 0,
                words_read INTEGER NOT NULL DEFAULT 0,
                computed_wpm INTEGER NOT NULL DEFAULT 0
            )
            "#,
            [],
        )?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS comprehension_results (
                session_id INTEGER PRIMARY KEY REFERENCES sessions(id),
                answers TEXT NOT NULL,
                score_percent INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_started_at ON sessions(started_at)",
            [],
        )?;
        Ok(())
    }

    /// Insert a freshly started session, returning its id
    pub fn insert_session(&self, session: &ReadingSession) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO sessions
            (mode, pace_wpm, chunk_size, passage_title, total_words, started_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                session.mode.to_string(),
                session.pace_wpm,
                session.chunk_size.map(|s| s as i64),
                session.passage_title,
                session.total_words as i64,
                session.started_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Write a completed session's metrics. The row must still be open:
    /// updating a finished row is a conflict, an unknown id is not-found.
    pub fn finish_session(&self, session: &ReadingSession) -> Result<()> {
        let id = session
            .id
            .ok_or_else(|| Error::not_found("session has no id"))?;
        let ended_at = session
            .ended_at
            .ok_or_else(|| Error::validation("session is not completed"))?;
        let changed = self.conn.execute(
            r#"
            UPDATE sessions
            SET ended_at = ?1, duration_ms = ?2, words_read = ?3, computed_wpm = ?4
            WHERE id = ?5 AND ended_at IS NULL
            "#,
            params![
                ended_at.to_rfc3339(),
                session.duration_ms,
                session.words_read as i64,
                session.computed_wpm,
                id,
            ],
        )?;
        if changed == 1 {
            return Ok(());
        }
        let exists: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if exists > 0 {
            Err(Error::conflict(format!("session {id} is already completed")))
        } else {
            Err(Error::not_found(format!("session {id}")))
        }
    }

    /// Store a comprehension result for a session, idempotently: when a
    /// result already exists it is returned unchanged, regardless of the
    /// answers submitted this time.
    pub fn record_result(
        &self,
        session_id: i64,
        answers: &[usize],
        score_percent: u32,
    ) -> Result<ComprehensionResult> {
        if let Some(existing) = self.result_for(session_id)? {
            return Ok(existing);
        }
        let exists: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(Error::not_found(format!("session {session_id}")));
        }
        let answers_json =
            serde_json::to_string(answers).expect("a vec of indices always serializes");
        self.conn.execute(
            r#"
            INSERT INTO comprehension_results (session_id, answers, score_percent, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                session_id,
                answers_json,
                score_percent,
                Local::now().to_rfc3339()
            ],
        )?;
        Ok(ComprehensionResult {
            session_id,
            answers: answers.to_vec(),
            score_percent,
        })
    }

    /// Fetch the stored result for a session, if any
    pub fn result_for(&self, session_id: i64) -> Result<Option<ComprehensionResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT answers, score_percent FROM comprehension_results WHERE session_id = ?1",
        )?;
        let mut rows = stmt.query_map(params![session_id], |row| {
            let answers_json: String = row.get(0)?;
            let answers: Vec<usize> = serde_json::from_str(&answers_json).map_err(|_| {
                rusqlite::Error::InvalidColumnType(
                    0,
                    "answers".to_string(),
                    rusqlite::types::Type::Text,
                )
            })?;
            Ok(ComprehensionResult {
                session_id,
                answers,
                score_percent: row.get(1)?,
            })
        })?;
        match rows.next() {
            Some(result) => Ok(Some(result?)),
            None => Ok(None),
        }
    }

    /// Every session joined with its optional score, oldest first —
    /// the aggregator's input
    pub fn session_records(&self) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.id, s.mode, s.ended_at, s.duration_ms, s.words_read,
                   s.computed_wpm, r.score_percent
            FROM sessions s
            LEFT JOIN comprehension_results r ON r.session_id = s.id
            ORDER BY s.id
            "#,
        )?;
        let record_iter = stmt.query_map([], |row| {
            let mode_str: String = row.get(1)?;
            let mode = mode_str.parse::<ReadingMode>().map_err(|_| {
                rusqlite::Error::InvalidColumnType(
                    1,
                    "mode".to_string(),
                    rusqlite::types::Type::Text,
                )
            })?;
            let ended_at: Option<String> = row.get(2)?;
            let ended_at = match ended_at {
                Some(ts) => Some(parse_timestamp(&ts, 2)?),
                None => None,
            };
            Ok(SessionRecord {
                id: row.get(0)?,
                mode,
                ended_at,
                duration_ms: row.get(3)?,
                words_read: row.get::<_, i64>(4)? as u64,
                computed_wpm: row.get(5)?,
                score_percent: row.get(6)?,
            })
        })?;

        let mut records = Vec::new();
        for record in record_iter {
            records.push(record?);
        }
        Ok(records)
    }

    /// Dump the full session history as CSV
    pub fn export_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.started_at, s.mode, s.pace_wpm, s.chunk_size, s.passage_title,
                   s.total_words, s.ended_at, s.duration_ms, s.words_read,
                   s.computed_wpm, r.score_percent
            FROM sessions s
            LEFT JOIN comprehension_results r ON r.session_id = s.id
            ORDER BY s.id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok([
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?.to_string(),
                row.get::<_, Option<i64>>(3)?
                    .map_or(String::new(), |v| v.to_string()),
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?.to_string(),
                row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                row.get::<_, i64>(7)?.to_string(),
                row.get::<_, i64>(8)?.to_string(),
                row.get::<_, i64>(9)?.to_string(),
                row.get::<_, Option<i64>>(10)?
                    .map_or(String::new(), |v| v.to_string()),
            ])
        })?;

        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record([
            "started_at",
            "mode",
            "pace_wpm",
            "chunk_size",
            "passage",
            "total_words",
            "ended_at",
            "duration_ms",
            "words_read",
            "computed_wpm",
            "score_percent",
        ])?;
        for row in rows {
            wtr.write_record(row?)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn parse_timestamp(ts: &str, column: usize) -> rusqlite::Result<DateTime<Local>> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                column,
                "timestamp".to_string(),
                rusqlite::types::Type::Text,
            )
        })
}
