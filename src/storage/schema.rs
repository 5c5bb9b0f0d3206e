//! SQLite schema for price records and report documents
//!
//! Tables:
//! - price_records: One row per player id, with a stable row reference
//! - price_quotes: Latest observed price per (record, grade)
//! - reports: Report documents, packs stored as a JSON array

use rusqlite::{Connection, Result};

/// Create all tables in the database
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS price_records (
            record_ref INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
        [],
    )?;

    // One element per grade; the UNIQUE pair is what keeps upserts idempotent
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS price_quotes (
            record_ref INTEGER NOT NULL REFERENCES price_records(record_ref),
            grade INTEGER NOT NULL,
            price TEXT NOT NULL,
            UNIQUE(record_ref, grade)
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS reports (
            id TEXT PRIMARY KEY,
            update_time TEXT NOT NULL,
            season_pack TEXT NOT NULL
        )
        "#,
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_price_quotes_record ON price_quotes(record_ref)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_create_tables() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN
                 ('price_records', 'price_quotes', 'reports')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_create_tables_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }
}
