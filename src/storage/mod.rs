//! SQLite storage for price records and report documents
//!
//! Both repositories live in the same database file. Price writes and the
//! report write are separate statements, not one transaction.

pub mod prices;
pub mod reports;
pub mod schema;

pub use prices::PriceRepository;
pub use reports::ReportRepository;
pub use schema::create_tables;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open (or create) the database and make sure the schema exists
pub fn open_database(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    conn.execute("PRAGMA foreign_keys = ON", [])?;
    create_tables(&conn)?;

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScrapeResult;

    #[test]
    fn test_repositories_share_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prices.db");

        let mut prices = PriceRepository::new(&path).unwrap();
        prices
            .upsert_quotes(&[ScrapeResult::observed(1, 5, "500")])
            .unwrap();
        let reports = ReportRepository::new(&path).unwrap();

        assert!(path.exists());
        assert_eq!(reports.report_count().unwrap(), 0);
        assert!(PriceRepository::new(&path)
            .unwrap()
            .find_record_ref(1)
            .unwrap()
            .is_some());
    }
}
