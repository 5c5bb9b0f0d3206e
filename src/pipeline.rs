//! End-to-end run: candidates, scrape, persist, rank, publish.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{error, info, warn};

use crate::candidates::{CandidateQuery, Catalog};
use crate::config::{AppConfig, PackSettings};
use crate::ranking::rank;
use crate::report::merge_into_report;
use crate::scraper::{scrape_in_session, Restrictions};
use crate::storage::{PriceRepository, ReportRepository};
use crate::types::{Entity, PackEntry, ReportDocument, ScrapeResult, SeasonPack};

/// Stores and static inputs shared by every pack of a run
pub struct Pipeline {
    catalog: Catalog,
    restrictions: Restrictions,
    prices: PriceRepository,
    reports: ReportRepository,
}

impl Pipeline {
    pub fn new(
        catalog: Catalog,
        restrictions: Restrictions,
        prices: PriceRepository,
        reports: ReportRepository,
    ) -> Self {
        Self {
            catalog,
            restrictions,
            prices,
            reports,
        }
    }

    /// Open stores and load static inputs named in `config`
    pub fn open(config: &AppConfig) -> Result<Self> {
        let db_path = Path::new(&config.storage.database);
        let prices = PriceRepository::new(db_path)?;
        let reports = ReportRepository::new(db_path)?;
        let catalog = Catalog::load(&config.storage.catalog)?;
        let restrictions = Restrictions::load(&config.storage.restrictions)?;
        Ok(Self::new(catalog, restrictions, prices, reports))
    }

    /// Unrestricted candidates for a pack
    pub fn candidates(&self, pack: &PackSettings) -> Vec<Entity> {
        let query = CandidateQuery {
            seasons: pack.seasons.clone(),
            minimum_overall: pack.minimum_overall,
        };
        let found = self.catalog.search(&query);
        let allowed = self.restrictions.filter(found);
        info!("Pack {}: {} candidates", pack.name, allowed.len());
        allowed
    }

    /// Persist scrape results, rank them and build the pack.
    ///
    /// A failed price write is logged and the pack is still built from
    /// whatever records exist.
    pub fn finish_pack(&mut self, pack: &PackSettings, results: &[ScrapeResult]) -> Result<SeasonPack> {
        if let Err(e) = self.prices.upsert_quotes(results) {
            error!("Price bulk write failed for pack {}: {:#}", pack.name, e);
        }

        let ranked = rank(results, pack.limit);

        let mut season_pack = SeasonPack::new(pack.name.clone());
        for item in &ranked {
            let record_ref = self
                .prices
                .find_record_ref(item.id)
                .with_context(|| format!("Failed to look up price record {}", item.id))?;
            match record_ref {
                Some(record_ref) => season_pack.player_price.push(PackEntry {
                    grade: item.prices.grade,
                    player_price: Some(record_ref),
                }),
                None => warn!("No price record for ID {}, skipped", item.id),
            }
        }

        info!(
            "Pack {}: {} ranked entries",
            pack.name,
            season_pack.player_price.len()
        );
        Ok(season_pack)
    }

    /// Merge built packs into the configured report
    pub fn publish(
        &self,
        report_id: &str,
        packs: Vec<SeasonPack>,
        now: DateTime<Utc>,
    ) -> Result<ReportDocument> {
        merge_into_report(&self.reports, report_id, packs, now)
            .with_context(|| format!("Failed to merge report {}", report_id))
    }
}

/// Run every selected pack once and publish the report.
pub async fn run(config: &AppConfig, pack_names: &[String]) -> Result<ReportDocument> {
    let packs = config.selected_packs(pack_names);
    if packs.is_empty() {
        anyhow::bail!("No packs selected (requested: {:?})", pack_names);
    }

    let mut pipeline = Pipeline::open(config)?;
    let mut built = Vec::with_capacity(packs.len());

    for pack in &packs {
        let entities = pipeline.candidates(pack);
        let results =
            scrape_in_session(&config.browser, &config.scraper, &entities, &pack.grades)
                .await
                .with_context(|| format!("Scrape aborted for pack {}", pack.name))?;
        built.push(pipeline.finish_pack(pack, &results)?);
    }

    pipeline.publish(&config.report.id, built, Utc::now())
}
