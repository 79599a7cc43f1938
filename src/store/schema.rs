use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS review_records (
      username TEXT NOT NULL,
      item_id TEXT NOT NULL,
      ease_factor REAL NOT NULL DEFAULT 2.5,
      repetition INTEGER NOT NULL DEFAULT 0,
      interval_days INTEGER NOT NULL DEFAULT 1,
      next_review TEXT NOT NULL,
      total_attempts INTEGER NOT NULL DEFAULT 0,
      correct_attempts INTEGER NOT NULL DEFAULT 0,
      last_response_time REAL NOT NULL DEFAULT 0,
      avg_response_time REAL NOT NULL DEFAULT 0,
      created_at TEXT NOT NULL,
      PRIMARY KEY (username, item_id)
    );

    CREATE INDEX IF NOT EXISTS idx_review_records_next_review ON review_records(username, next_review);
    "#,
  )?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn column_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn.prepare("PRAGMA table_info(review_records)").unwrap();
    stmt
      .query_map([], |row| row.get::<_, String>(1))
      .unwrap()
      .collect::<Result<Vec<_>>>()
      .unwrap()
  }

  #[test]
  fn test_migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();
    assert_eq!(column_names(&conn).len(), 11);
  }

  #[test]
  fn test_creates_every_record_column() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();

    let columns = column_names(&conn);
    for column in [
      "username",
      "item_id",
      "ease_factor",
      "repetition",
      "interval_days",
      "next_review",
      "total_attempts",
      "correct_attempts",
      "last_response_time",
      "avg_response_time",
      "created_at",
    ] {
      assert!(columns.iter().any(|c| c == column), "missing {}", column);
    }
  }
}
