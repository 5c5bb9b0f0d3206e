//! Per-item price scraping with sentinel fallback.
//!
//! The loop never stops on a single failed pair: every attempt produces a
//! `ScrapeResult`, either with the observed price or with the `Error`
//! sentinel. Only a browser that cannot be acquired ends the batch.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use super::browser::BrowserSession;
use super::parsers::{readiness_script, PriceParser};
use super::resource_filter::ResourceFilter;
use super::player_info_url;
use crate::config::{BrowserSettings, ScraperSettings};
use crate::types::{Entity, ScrapeResult};

/// Recoverable failure of one (player, grade) attempt
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("page setup failed: {0}")]
    Page(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("price not ready after {0:?}")]
    Timeout(Duration),
    #[error("price element missing or empty")]
    MissingElement,
}

/// Fetches the displayed price for one player at one grade
#[async_trait(?Send)]
pub trait QuoteSource {
    async fn fetch_quote(&mut self, id: u64, grade: u8) -> Result<String, ScrapeError>;
}

/// Scrape every entity at every grade, entity-major.
pub async fn scrape_prices<S: QuoteSource + ?Sized>(
    source: &mut S,
    entities: &[Entity],
    grades: &[u8],
) -> Vec<ScrapeResult> {
    let mut results = Vec::with_capacity(entities.len() * grades.len());

    for entity in entities {
        for &grade in grades {
            match source.fetch_quote(entity.id, grade).await {
                Ok(text) => {
                    let result = ScrapeResult::observed(entity.id, grade, text);
                    if result.prices.price.is_error() {
                        warn!(id = entity.id, grade, stage = "extract", "empty price text");
                    } else {
                        info!("ID {} / Grade {} -> {}", entity.id, grade, result.prices.price);
                    }
                    results.push(result);
                }
                Err(e) => {
                    warn!(id = entity.id, grade, error = %e, "price scrape failed");
                    results.push(ScrapeResult::failed(entity.id, grade));
                }
            }
        }
    }

    let failed = results.iter().filter(|r| r.prices.price.is_error()).count();
    info!(
        "Scraped {} quotes ({} failed) for {} players",
        results.len(),
        failed,
        entities.len()
    );
    results
}

/// `QuoteSource` backed by pages of a live browser session
pub struct PageQuoteSource<'a> {
    session: &'a BrowserSession,
    filter: ResourceFilter,
    parser: PriceParser,
    ready_script: String,
    base_url: String,
    navigation_timeout: Duration,
    wait_timeout: Duration,
    poll_interval: Duration,
}

impl<'a> PageQuoteSource<'a> {
    pub fn new(session: &'a BrowserSession, settings: &ScraperSettings) -> anyhow::Result<Self> {
        Ok(Self {
            session,
            filter: ResourceFilter::new(settings.blocked_domains.clone()),
            parser: PriceParser::new(&settings.price_selector)?,
            ready_script: readiness_script(&settings.price_selector),
            base_url: settings.base_url.clone(),
            navigation_timeout: Duration::from_secs(settings.navigation_timeout_secs),
            wait_timeout: Duration::from_secs(settings.wait_timeout_secs),
            poll_interval: Duration::from_millis(settings.poll_interval_ms.max(1)),
        })
    }

    async fn read_price(
        &self,
        page: &chromiumoxide::page::Page,
        url: &str,
    ) -> Result<String, ScrapeError> {
        info!("Navigating to {}", url);
        match tokio::time::timeout(self.navigation_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(ScrapeError::Navigation(e.to_string())),
            Err(_) => {
                return Err(ScrapeError::Navigation(format!(
                    "timed out after {:?}",
                    self.navigation_timeout
                )))
            }
        }

        tokio::time::timeout(self.wait_timeout, self.wait_until_ready(page))
            .await
            .map_err(|_| ScrapeError::Timeout(self.wait_timeout))?;

        let html = page
            .content()
            .await
            .map_err(|e| ScrapeError::Page(e.to_string()))?;
        self.parser.parse(&html).ok_or(ScrapeError::MissingElement)
    }

    async fn wait_until_ready(&self, page: &chromiumoxide::page::Page) {
        loop {
            let ready = match page.evaluate(self.ready_script.as_str()).await {
                Ok(value) => value.into_value::<bool>().unwrap_or(false),
                Err(_) => false,
            };
            if ready {
                return;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait(?Send)]
impl QuoteSource for PageQuoteSource<'_> {
    async fn fetch_quote(&mut self, id: u64, grade: u8) -> Result<String, ScrapeError> {
        let url = player_info_url(&self.base_url, id, grade);
        let page = self
            .session
            .new_page()
            .await
            .map_err(|e| ScrapeError::Page(e.to_string()))?;

        let outcome = match self.filter.install(&page).await {
            Ok(_guard) => self.read_price(&page, &url).await,
            Err(e) => Err(ScrapeError::Page(e.to_string())),
        };

        // Closed on every outcome
        if let Err(e) = page.close().await {
            warn!("Failed to close page for ID {} / Grade {}: {}", id, grade, e);
        }
        outcome
    }
}

/// Scrape `entities` x `grades` inside a freshly acquired browser session.
///
/// The session is released on every path. An acquisition failure is
/// returned as an error; per-item failures are recorded as sentinels.
pub async fn scrape_in_session(
    browser: &BrowserSettings,
    scraper: &ScraperSettings,
    entities: &[Entity],
    grades: &[u8],
) -> anyhow::Result<Vec<ScrapeResult>> {
    let mut session = BrowserSession::new(browser.clone());

    let outcome = async {
        session.acquire().await?;
        session.new_context().await?;
        let mut source = PageQuoteSource::new(&session, scraper)?;
        Ok::<_, anyhow::Error>(scrape_prices(&mut source, entities, grades).await)
    }
    .await;

    session.release().await;
    outcome
}
