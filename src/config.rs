//! Configuration for the price ranker.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Browser launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Chrome executable; auto-detected when unset
    #[serde(default)]
    pub executable: Option<String>,
    #[serde(default = "default_launch_retries")]
    pub launch_retries: u32,
}

fn default_launch_retries() -> u32 {
    2
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            launch_retries: default_launch_retries(),
        }
    }
}

/// Scraper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_price_selector")]
    pub price_selector: String,
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_blocked_domains")]
    pub blocked_domains: Vec<String>,
}

fn default_base_url() -> String {
    crate::scraper::BASE_URL.to_string()
}

fn default_price_selector() -> String {
    ".txt strong".to_string()
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_wait_timeout_secs() -> u64 {
    80
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_blocked_domains() -> Vec<String> {
    vec![
        "google-analytics.com".to_string(),
        "doubleclick.net".to_string(),
    ]
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            price_selector: default_price_selector(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            wait_timeout_secs: default_wait_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            blocked_domains: default_blocked_domains(),
        }
    }
}

/// Storage and static input files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_catalog")]
    pub catalog: String,
    #[serde(default = "default_restrictions")]
    pub restrictions: String,
}

fn default_database() -> String {
    "data/prices.db".to_string()
}

fn default_catalog() -> String {
    "data/catalog.json".to_string()
}

fn default_restrictions() -> String {
    "seed/player_restrictions.json".to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database: default_database(),
            catalog: default_catalog(),
            restrictions: default_restrictions(),
        }
    }
}

/// Report document target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "default_report_id")]
    pub id: String,
}

fn default_report_id() -> String {
    "new 아이콘 로드 3500".to_string()
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            id: default_report_id(),
        }
    }
}

/// One ranked pack to compute per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackSettings {
    pub name: String,
    /// Season codes; only the last three digits are significant
    #[serde(default)]
    pub seasons: Vec<u32>,
    #[serde(default)]
    pub minimum_overall: u32,
    /// A single grade or a list of grades
    #[serde(deserialize_with = "one_or_many")]
    pub grades: Vec<u8>,
    /// Keep only the top N ranked quotes
    #[serde(default)]
    pub limit: Option<usize>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Grades {
        One(u8),
        Many(Vec<u8>),
    }

    Ok(match Grades::deserialize(deserializer)? {
        Grades::One(grade) => vec![grade],
        Grades::Many(grades) => grades,
    })
}

fn default_packs() -> Vec<PackSettings> {
    vec![PackSettings {
        name: "CU 클래스 Top Price 150 스페셜팩 (8강, 110+)".to_string(),
        seasons: vec![111, 101, 821, 814, 830, 802, 289, 291, 283],
        minimum_overall: 111,
        grades: vec![5, 6, 7, 8],
        limit: Some(550),
    }]
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub scraper: ScraperSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default = "default_packs")]
    pub packs: Vec<PackSettings>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            browser: BrowserSettings::default(),
            scraper: ScraperSettings::default(),
            storage: StorageSettings::default(),
            report: ReportSettings::default(),
            packs: default_packs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or from `config.toml` (if present)
    /// when no path is given, then apply environment overrides
    pub fn load_from(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name("config").required(false),
        };

        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(file)
            // Override with environment variables (FCPRICE_REPORT__ID, etc.)
            .add_source(
                config::Environment::with_prefix("FCPRICE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Packs selected by name; all packs when `names` is empty
    pub fn selected_packs(&self, names: &[String]) -> Vec<PackSettings> {
        if names.is_empty() {
            return self.packs.clone();
        }
        self.packs
            .iter()
            .filter(|p| names.iter().any(|n| n == &p.name))
            .cloned()
            .collect()
    }
}
