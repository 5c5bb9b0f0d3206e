//! SQLite repository for report documents

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::types::{ReportDocument, SeasonPack};

/// Repository for report documents, one row per report id
pub struct ReportRepository {
    conn: Connection,
}

impl ReportRepository {
    /// Open the repository, initializing the database if needed
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = super::open_database(db_path)?;
        Ok(Self { conn })
    }

    /// Create an in-memory repository (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        super::schema::create_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Write a raw row, bypassing serialization (for testing)
    #[cfg(test)]
    pub fn insert_raw(&self, id: &str, update_time: &str, season_pack: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO reports (id, update_time, season_pack) VALUES (?1, ?2, ?3)",
            params![id, update_time, season_pack],
        )?;
        Ok(())
    }

    /// Raw stored columns of a report (for testing)
    #[cfg(test)]
    pub fn raw_row(&self, id: &str) -> Result<(String, String)> {
        let row = self.conn.query_row(
            "SELECT update_time, season_pack FROM reports WHERE id = ?1",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(row)
    }

    /// Load a report by id
    pub fn find(&self, id: &str) -> Result<Option<ReportDocument>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT update_time, season_pack FROM reports WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .with_context(|| format!("Failed to read report {}", id))?;

        let Some((update_time, season_pack)) = row else {
            return Ok(None);
        };

        let update_time = DateTime::parse_from_rfc3339(&update_time)
            .with_context(|| format!("Invalid update time on report {}", id))?
            .with_timezone(&Utc);
        let season_pack: Vec<SeasonPack> = serde_json::from_str(&season_pack)
            .with_context(|| format!("Invalid pack list on report {}", id))?;

        Ok(Some(ReportDocument {
            id: id.to_string(),
            update_time,
            season_pack,
        }))
    }

    /// Replace the whole document, creating it if absent
    pub fn upsert(&self, report: &ReportDocument) -> Result<()> {
        let season_pack = serde_json::to_string(&report.season_pack)?;
        self.conn
            .execute(
                r#"
                INSERT INTO reports (id, update_time, season_pack)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(id) DO UPDATE SET
                    update_time = excluded.update_time,
                    season_pack = excluded.season_pack
                "#,
                params![report.id, report.update_time.to_rfc3339(), season_pack],
            )
            .with_context(|| format!("Failed to write report {}", report.id))?;
        Ok(())
    }

    /// Number of stored reports
    pub fn report_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?;
        Ok(count)
    }
}
