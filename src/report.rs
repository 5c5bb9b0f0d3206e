//! Report merging.
//!
//! A report holds every pack computed under one report id. New packs replace
//! the stored pack with the same name or are appended; packs are never
//! removed.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::storage::ReportRepository;
use crate::types::{ReportDocument, SeasonPack};

/// Offset applied to `updateTime` (KST wall clock)
pub const REPORT_OFFSET_HOURS: i64 = 9;

/// Timestamp written on a merged report
pub fn report_time(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::hours(REPORT_OFFSET_HOURS)
}

/// Merge `incoming` packs into the stored list.
///
/// Without a stored list the result is exactly `incoming`.
pub fn merge_packs(existing: Option<&[SeasonPack]>, incoming: Vec<SeasonPack>) -> Vec<SeasonPack> {
    let Some(existing) = existing else {
        return incoming;
    };

    let mut merged = existing.to_vec();
    for pack in incoming {
        match merged.iter_mut().find(|p| p.pack_name == pack.pack_name) {
            Some(slot) => {
                // Shallow merge: stored extras survive unless the new pack sets them
                let mut extra = std::mem::take(&mut slot.extra);
                extra.extend(pack.extra);
                *slot = SeasonPack {
                    pack_name: pack.pack_name,
                    player_price: pack.player_price,
                    extra,
                };
            }
            None => merged.push(pack),
        }
    }
    merged
}

/// Read the report, merge `packs` into it, stamp it and write it back.
pub fn merge_into_report(
    store: &ReportRepository,
    report_id: &str,
    packs: Vec<SeasonPack>,
    now: DateTime<Utc>,
) -> Result<ReportDocument> {
    let existing = store.find(report_id)?;
    let season_pack = merge_packs(existing.as_ref().map(|r| r.season_pack.as_slice()), packs);

    let report = ReportDocument {
        id: report_id.to_string(),
        update_time: report_time(now),
        season_pack,
    };
    store.upsert(&report)?;

    info!(
        "Report {} saved with {} packs (updated {})",
        report.id,
        report.season_pack.len(),
        report.update_time
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackEntry;
    use chrono::TimeZone;

    fn pack(name: &str, refs: &[i64]) -> SeasonPack {
        let mut p = SeasonPack::new(name);
        p.player_price = refs
            .iter()
            .map(|r| PackEntry {
                grade: 5,
                player_price: Some(*r),
            })
            .collect();
        p
    }

    #[test]
    fn test_report_time_is_nine_hours_ahead() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 20, 30, 0).unwrap();
        let stamped = report_time(now);
        assert_eq!(stamped, Utc.with_ymd_and_hms(2024, 6, 2, 5, 30, 0).unwrap());
        assert_eq!(stamped - now, Duration::hours(9));
    }

    #[test]
    fn test_merge_without_existing_uses_incoming() {
        let merged = merge_packs(None, vec![pack("A", &[1])]);
        assert_eq!(merged, vec![pack("A", &[1])]);
    }

    #[test]
    fn test_merge_replaces_only_matching_pack() {
        let mut other = pack("B", &[7, 8]);
        other
            .extra
            .insert("note".to_string(), serde_json::json!("keep me"));
        let existing = vec![pack("A", &[1]), other.clone(), pack("C", &[9])];
        let before_b = serde_json::to_string(&existing[1]).unwrap();
        let before_c = serde_json::to_string(&existing[2]).unwrap();

        let merged = merge_packs(Some(existing.as_slice()), vec![pack("A", &[2, 3])]);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0], pack("A", &[2, 3]));
        assert_eq!(serde_json::to_string(&merged[1]).unwrap(), before_b);
        assert_eq!(serde_json::to_string(&merged[2]).unwrap(), before_c);
    }

    #[test]
    fn test_merge_appends_new_pack() {
        let existing = vec![pack("A", &[1])];
        let merged = merge_packs(Some(existing.as_slice()), vec![pack("Z", &[4])]);
        assert_eq!(merged, vec![pack("A", &[1]), pack("Z", &[4])]);
    }

    #[test]
    fn test_merge_keeps_stored_extras() {
        let mut stored = pack("A", &[1]);
        stored
            .extra
            .insert("banner".to_string(), serde_json::json!("a.png"));
        stored.extra.insert("order".to_string(), serde_json::json!(1));

        let mut incoming = pack("A", &[5]);
        incoming.extra.insert("order".to_string(), serde_json::json!(2));

        let merged = merge_packs(Some(std::slice::from_ref(&stored)), vec![incoming]);
        assert_eq!(merged[0].player_price[0].player_price, Some(5));
        assert_eq!(merged[0].extra["banner"], "a.png");
        assert_eq!(merged[0].extra["order"], 2);
    }

    #[test]
    fn test_merge_into_missing_report_creates_it() {
        let store = ReportRepository::in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let report = merge_into_report(&store, "weekly", vec![pack("A", &[1])], now).unwrap();

        assert_eq!(report.season_pack, vec![pack("A", &[1])]);
        assert_eq!(report.update_time, now + Duration::hours(9));
        assert_eq!(store.find("weekly").unwrap().unwrap(), report);
    }

    #[test]
    fn test_merge_into_existing_report() {
        let store = ReportRepository::in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        merge_into_report(&store, "weekly", vec![pack("A", &[1]), pack("B", &[2])], now).unwrap();

        let later = now + Duration::days(1);
        let report = merge_into_report(&store, "weekly", vec![pack("B", &[3])], later).unwrap();

        assert_eq!(report.season_pack, vec![pack("A", &[1]), pack("B", &[3])]);
        assert_eq!(report.update_time, later + Duration::hours(9));
        assert_eq!(store.report_count().unwrap(), 1);
    }

    #[test]
    fn test_unreadable_report_is_not_overwritten() {
        let store = ReportRepository::in_memory().unwrap();
        store
            .insert_raw("weekly", "2024-06-01T21:00:00+00:00", "{not json")
            .unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap();

        let outcome = merge_into_report(&store, "weekly", vec![pack("A", &[1])], now);

        assert!(outcome.is_err());
        let (update_time, season_pack) = store.raw_row("weekly").unwrap();
        assert_eq!(update_time, "2024-06-01T21:00:00+00:00");
        assert_eq!(season_pack, "{not json");
    }
}
