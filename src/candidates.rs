//! Candidate selection from the player catalog.
//!
//! Player ids encode their season in the leading digits: a season `s` owns
//! ids `s * 1_000_000 ..= s * 1_000_000 + 999_999`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::types::Entity;

/// Rows returned per season at most
pub const MAX_PER_SEASON: usize = 10_000;

/// Overall filters at or below this value are ignored
const OVERALL_FLOOR: u32 = 10;

/// One player in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u64,
    /// Best position overall
    #[serde(default)]
    pub overall: Option<u32>,
}

/// Season and overall filter for one pack
#[derive(Debug, Clone, Default)]
pub struct CandidateQuery {
    pub seasons: Vec<u32>,
    pub minimum_overall: u32,
}

/// Season number from a season code (last three digits)
pub fn season_number(code: u32) -> u64 {
    (code % 1000) as u64
}

fn season_range(code: u32) -> (u64, u64) {
    let start = season_number(code) * 1_000_000;
    (start, start + 999_999)
}

/// In-memory player catalog loaded from JSON
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Load the catalog from a JSON array file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let entries: Vec<CatalogEntry> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog {}", path.display()))?;
        info!("Loaded catalog: {} players", entries.len());
        Ok(Self::new(entries))
    }

    /// Entities matching `query`, season by season in query order
    pub fn search(&self, query: &CandidateQuery) -> Vec<Entity> {
        let passes_overall = |e: &CatalogEntry| {
            query.minimum_overall <= OVERALL_FLOOR
                || e.overall.unwrap_or(0) >= query.minimum_overall
        };

        if query.seasons.is_empty() {
            return Self::best_first(self.entries.iter().filter(|e| passes_overall(*e)));
        }

        let mut found = Vec::new();
        for code in &query.seasons {
            let (low, high) = season_range(*code);
            found.extend(Self::best_first(
                self.entries
                    .iter()
                    .filter(|e| e.id >= low && e.id <= high)
                    .filter(|e| passes_overall(*e)),
            ));
        }
        found
    }

    fn best_first<'a>(rows: impl Iterator<Item = &'a CatalogEntry>) -> Vec<Entity> {
        let mut rows: Vec<&CatalogEntry> = rows.collect();
        rows.sort_by(|a, b| b.overall.unwrap_or(0).cmp(&a.overall.unwrap_or(0)));
        rows.into_iter()
            .take(MAX_PER_SEASON)
            .map(|e| Entity::new(e.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, overall: u32) -> CatalogEntry {
        CatalogEntry {
            id,
            overall: Some(overall),
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            entry(111_000_001, 112),
            entry(111_000_002, 118),
            entry(111_000_003, 100),
            entry(101_000_010, 120),
            entry(830_000_001, 115),
        ])
    }

    fn ids(entities: &[Entity]) -> Vec<u64> {
        entities.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_season_number_uses_last_three_digits() {
        assert_eq!(season_number(111), 111);
        assert_eq!(season_number(2111), 111);
        assert_eq!(season_range(101), (101_000_000, 101_999_999));
    }

    #[test]
    fn test_search_by_season_and_overall() {
        let query = CandidateQuery {
            seasons: vec![111, 101],
            minimum_overall: 111,
        };
        let found = catalog().search(&query);
        assert_eq!(ids(&found), vec![111_000_002, 111_000_001, 101_000_010]);
    }

    #[test]
    fn test_low_overall_threshold_is_ignored() {
        let query = CandidateQuery {
            seasons: vec![111],
            minimum_overall: 10,
        };
        assert_eq!(catalog().search(&query).len(), 3);
    }

    #[test]
    fn test_no_seasons_searches_everything() {
        let query = CandidateQuery {
            seasons: vec![],
            minimum_overall: 115,
        };
        let found = catalog().search(&query);
        assert_eq!(ids(&found), vec![101_000_010, 111_000_002, 830_000_001]);
    }

    #[test]
    fn test_load_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"[{"id": 111000001, "overall": 112}, {"id": 5}]"#).unwrap();

        let catalog = Catalog::load(&path).unwrap();
        let found = catalog.search(&CandidateQuery::default());
        assert_eq!(ids(&found), vec![111_000_001, 5]);
    }
}
