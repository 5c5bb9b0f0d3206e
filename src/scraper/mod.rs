//! Price scraper for the FC Online DataCenter
//!
//! Provides the browser session, request filtering, restriction filtering
//! and the per-item quote loop.

pub mod browser;
pub mod parsers;
pub mod quotes;
pub mod resource_filter;
pub mod restrictions;

pub use quotes::{scrape_in_session, scrape_prices, QuoteSource, ScrapeError};
pub use restrictions::Restrictions;

/// Base URL of the DataCenter
pub const BASE_URL: &str = "https://fconline.nexon.com/DataCenter";

/// Build the player info URL for one grade
/// URL: <base>/PlayerInfo?spid=ID&n1Strong=GRADE
pub fn player_info_url(base_url: &str, id: u64, grade: u8) -> String {
    format!(
        "{}/PlayerInfo?spid={}&n1Strong={}",
        base_url.trim_end_matches('/'),
        id,
        grade
    )
}
