//! Shared record types for the price pipeline.
//!
//! Field names of the persisted documents follow the camelCase shape the
//! report consumers read (`packName`, `playerPrice`, `seasonPack`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal written in place of a price when extraction failed.
pub const PRICE_SENTINEL: &str = "Error";

/// A tradeable player card, identified by its spid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub id: u64,
}

impl Entity {
    pub fn new(id: u64) -> Self {
        Self { id }
    }
}

/// Price text observed for one grade, or the failure marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuotedPrice {
    Observed(String),
    Error,
}

impl QuotedPrice {
    pub fn as_str(&self) -> &str {
        match self {
            QuotedPrice::Observed(text) => text,
            QuotedPrice::Error => PRICE_SENTINEL,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QuotedPrice::Error)
    }
}

impl From<String> for QuotedPrice {
    fn from(text: String) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == PRICE_SENTINEL {
            QuotedPrice::Error
        } else {
            QuotedPrice::Observed(trimmed.to_string())
        }
    }
}

impl From<QuotedPrice> for String {
    fn from(price: QuotedPrice) -> Self {
        price.as_str().to_string()
    }
}

impl fmt::Display for QuotedPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed price for one enhancement grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeQuote {
    pub grade: u8,
    pub price: QuotedPrice,
}

/// Outcome of one (entity, grade) scrape attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub id: u64,
    pub prices: GradeQuote,
}

impl ScrapeResult {
    pub fn observed(id: u64, grade: u8, text: impl Into<String>) -> Self {
        Self {
            id,
            prices: GradeQuote {
                grade,
                price: QuotedPrice::from(text.into()),
            },
        }
    }

    pub fn failed(id: u64, grade: u8) -> Self {
        Self {
            id,
            prices: GradeQuote {
                grade,
                price: QuotedPrice::Error,
            },
        }
    }
}

/// Persisted price record for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Row reference used by pack entries
    pub record_ref: i64,
    /// Player id, stored as text
    pub id: String,
    /// At most one quote per grade, ordered by grade
    pub prices: Vec<GradeQuote>,
}

/// Ranked slot inside a pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackEntry {
    pub grade: u8,
    #[serde(rename = "playerPrice")]
    pub player_price: Option<i64>,
}

/// Named, ranked bundle merged into a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonPack {
    #[serde(rename = "packName")]
    pub pack_name: String,
    #[serde(rename = "playerPrice", default)]
    pub player_price: Vec<PackEntry>,
    /// Fields written by other producers, carried through merges untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SeasonPack {
    pub fn new(pack_name: impl Into<String>) -> Self {
        Self {
            pack_name: pack_name.into(),
            player_price: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Aggregate report holding every pack for one report id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub id: String,
    #[serde(rename = "updateTime")]
    pub update_time: DateTime<Utc>,
    #[serde(rename = "seasonPack", default)]
    pub season_pack: Vec<SeasonPack>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_round_trips_as_plain_string() {
        let result = ScrapeResult::failed(3, 7);
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"id":3,"prices":{"grade":7,"price":"Error"}}"#);

        let back: ScrapeResult = serde_json::from_str(&json).unwrap();
        assert!(back.prices.price.is_error());
    }

    #[test]
    fn test_empty_text_becomes_sentinel() {
        let result = ScrapeResult::observed(1, 5, "   ");
        assert_eq!(result.prices.price, QuotedPrice::Error);
        assert_eq!(result.prices.price.as_str(), "Error");
    }

    #[test]
    fn test_observed_text_is_trimmed() {
        let result = ScrapeResult::observed(1, 5, " 1,234억\n");
        assert_eq!(result.prices.price.as_str(), "1,234억");
    }

    #[test]
    fn test_season_pack_keeps_unknown_fields() {
        let json = r#"{"packName":"A","playerPrice":[{"grade":5,"playerPrice":null}],"banner":"x.png"}"#;
        let pack: SeasonPack = serde_json::from_str(json).unwrap();
        assert_eq!(pack.pack_name, "A");
        assert_eq!(pack.player_price[0].player_price, None);
        assert_eq!(pack.extra.get("banner").unwrap(), "x.png");

        let value = serde_json::to_value(&pack).unwrap();
        assert_eq!(value["banner"], "x.png");
        assert_eq!(value["playerPrice"][0]["grade"], 5);
    }
}
