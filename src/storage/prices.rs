//! SQLite repository for per-player price records

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

use crate::types::{GradeQuote, PriceRecord, QuotedPrice, ScrapeResult};

/// Repository for price records
pub struct PriceRepository {
    conn: Connection,
}

impl PriceRepository {
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

    /// Make every later quote write fail (for testing)
    #[cfg(test)]
    pub fn reject_quote_writes(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TRIGGER reject_quotes BEFORE INSERT ON price_quotes
            BEGIN
                SELECT RAISE(ABORT, 'quote writes disabled');
            END;
            "#,
        )?;
        Ok(())
    }

    /// Write every result in one transaction.
    ///
    /// A record is created for ids seen for the first time. A grade already
    /// present on the record has its price overwritten; a new grade is
    /// appended. Returns the number of quotes written.
    pub fn upsert_quotes(&mut self, results: &[ScrapeResult]) -> Result<usize> {
        if results.is_empty() {
            info!("No price quotes to save");
            return Ok(0);
        }

        let tx = self
            .conn
            .transaction()
            .context("Failed to start price transaction")?;
        {
            let mut insert_record = tx.prepare_cached(
                r#"
                INSERT INTO price_records (id) VALUES (?1)
                ON CONFLICT(id) DO UPDATE SET updated_at = datetime('now')
                "#,
            )?;
            let mut select_ref =
                tx.prepare_cached("SELECT record_ref FROM price_records WHERE id = ?1")?;
            let mut upsert_quote = tx.prepare_cached(
                r#"
                INSERT INTO price_quotes (record_ref, grade, price)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(record_ref, grade) DO UPDATE SET price = excluded.price
                "#,
            )?;

            for result in results {
                let id = result.id.to_string();
                insert_record.execute([&id])?;
                let record_ref: i64 = select_ref.query_row([&id], |row| row.get(0))?;
                upsert_quote.execute(params![
                    record_ref,
                    result.prices.grade,
                    result.prices.price.as_str(),
                ])?;
                debug!(id = %id, grade = result.prices.grade, "quote staged");
            }
        }
        tx.commit().context("Failed to commit price transaction")?;

        info!("Saved {} price quotes", results.len());
        Ok(results.len())
    }

    /// Row reference of the record for a player, if one exists
    pub fn find_record_ref(&self, id: u64) -> Result<Option<i64>> {
        let record_ref = self
            .conn
            .query_row(
                "SELECT record_ref FROM price_records WHERE id = ?1",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(record_ref)
    }

    /// Full record with quotes ordered by grade
    pub fn find_record(&self, id: u64) -> Result<Option<PriceRecord>> {
        let Some(record_ref) = self.find_record_ref(id)? else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            r#"
            SELECT grade, price
            FROM price_quotes
            WHERE record_ref = ?1
            ORDER BY grade
            "#,
        )?;

        let prices = stmt
            .query_map([record_ref], |row| {
                let price: String = row.get(1)?;
                Ok(GradeQuote {
                    grade: row.get(0)?,
                    price: QuotedPrice::from(price),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(PriceRecord {
            record_ref,
            id: id.to_string(),
            prices,
        }))
    }

    /// Number of price records
    pub fn record_count(&self) -> Result<i64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM price_records", [], |row| row.get(0))?;
        Ok(count)
    }
}
