//! SQLite-backed review history.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};

use super::{run_migrations, try_lock, Result, ReviewStore, StorageError};
use crate::domain::{ItemId, ReviewRecord};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        run_migrations(&conn)?;
        tracing::info!("Opened review database at {}", path.display());
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

/// Timestamps are stored as fixed-width UTC RFC 3339 so they sort as text.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("{} '{}': {}", column, value, e)))
}

/// Raw row; timestamps are parsed after the query so a bad value surfaces as
/// `StorageError::Corrupt` instead of being replaced.
struct RecordRow {
    item_id: String,
    ease_factor: f64,
    repetition: u32,
    interval: u32,
    next_review: String,
    total_attempts: u32,
    correct_attempts: u32,
    last_response_time: f64,
    avg_response_time: f64,
    created_at: String,
}

impl RecordRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            item_id: row.get(0)?,
            ease_factor: row.get(1)?,
            repetition: row.get(2)?,
            interval: row.get(3)?,
            next_review: row.get(4)?,
            total_attempts: row.get(5)?,
            correct_attempts: row.get(6)?,
            last_response_time: row.get(7)?,
            avg_response_time: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_record(self) -> Result<(ItemId, ReviewRecord)> {
        let record = ReviewRecord {
            ease_factor: self.ease_factor,
            repetition: self.repetition,
            interval: self.interval,
            next_review: parse_timestamp(&self.next_review, "next_review")?,
            total_attempts: self.total_attempts,
            correct_attempts: self.correct_attempts,
            last_response_time: self.last_response_time,
            avg_response_time: self.avg_response_time,
            created_at: parse_timestamp(&self.created_at, "created_at")?,
        };
        Ok((ItemId::from_key(self.item_id), record))
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT item_id, ease_factor, repetition, interval_days, next_review, total_attempts,
           correct_attempts, last_response_time, avg_response_time, created_at
    FROM review_records
"#;

impl ReviewStore for SqliteStore {
    fn get(&self, user: &str, item: &ItemId) -> Result<Option<ReviewRecord>> {
        let conn = try_lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!("{} WHERE username = ?1 AND item_id = ?2", SELECT_COLUMNS))?;

        let mut rows = stmt.query(params![user, item.as_str()])?;
        if let Some(row) = rows.next()? {
            let (_, record) = RecordRow::from_row(row)?.into_record()?;
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }

    fn put(&self, user: &str, item: &ItemId, record: &ReviewRecord) -> Result<()> {
        let conn = try_lock(&self.conn)?;
        // created_at is never overwritten once the row exists
        conn.execute(
            r#"
    INSERT INTO review_records
      (username, item_id, ease_factor, repetition, interval_days, next_review, total_attempts,
       correct_attempts, last_response_time, avg_response_time, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    ON CONFLICT(username, item_id) DO UPDATE SET
      ease_factor = excluded.ease_factor,
      repetition = excluded.repetition,
      interval_days = excluded.interval_days,
      next_review = excluded.next_review,
      total_attempts = excluded.total_attempts,
      correct_attempts = excluded.correct_attempts,
      last_response_time = excluded.last_response_time,
      avg_response_time = excluded.avg_response_time
    "#,
            params![
                user,
                item.as_str(),
                record.ease_factor,
                record.repetition,
                record.interval,
                format_timestamp(&record.next_review),
                record.total_attempts,
                record.correct_attempts,
                record.last_response_time,
                record.avg_response_time,
                format_timestamp(&record.created_at),
            ],
        )?;
        Ok(())
    }

    fn all_for_user(&self, user: &str) -> Result<Vec<(ItemId, ReviewRecord)>> {
        let conn = try_lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!("{} WHERE username = ?1", SELECT_COLUMNS))?;

        let rows = stmt
            .query_map(params![user], RecordRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(RecordRow::into_record).collect()
    }
}
