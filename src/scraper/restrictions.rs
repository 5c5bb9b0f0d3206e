//! Restricted player ids, excluded before any page is opened.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use crate::types::Entity;

/// Immutable set of player ids that must never be scraped
#[derive(Debug, Clone, Default)]
pub struct Restrictions {
    ids: HashSet<u64>,
}

impl Restrictions {
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Load restricted ids from a JSON array file.
    ///
    /// A missing file yields an empty set; a malformed one is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Restriction file not found: {}, nothing excluded", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read restrictions {}", path.display()))?;
        let ids: Vec<u64> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse restrictions {}", path.display()))?;

        info!("Loaded {} restricted player ids", ids.len());
        Ok(Self::new(ids))
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Drop restricted entities, keeping the order of the rest
    pub fn filter(&self, candidates: Vec<Entity>) -> Vec<Entity> {
        let before = candidates.len();
        let allowed: Vec<Entity> = candidates
            .into_iter()
            .filter(|e| !self.contains(e.id))
            .collect();
        if allowed.len() < before {
            info!("Excluded {} restricted players", before - allowed.len());
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_drops_restricted_ids() {
        let restrictions = Restrictions::new([2, 4]);
        let candidates = vec![1, 2, 3, 4, 5].into_iter().map(Entity::new).collect();

        let allowed = restrictions.filter(candidates);
        let ids: Vec<u64> = allowed.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let restrictions = Restrictions::load(dir.path().join("absent.json")).unwrap();
        assert!(restrictions.is_empty());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("restrictions.json");
        std::fs::write(&path, "[101001001, 230000123]").unwrap();

        let restrictions = Restrictions::load(&path).unwrap();
        assert_eq!(restrictions.len(), 2);
        assert!(restrictions.contains(230000123));
        assert!(!restrictions.contains(1));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("restrictions.json");
        std::fs::write(&path, "{\"ids\": [1]}").unwrap();

        assert!(Restrictions::load(&path).is_err());
    }
}
