//! FC Online price ranker
//!
//! Scrapes per-grade market prices, stores them, ranks each configured pack
//! and merges the result into the published report.

mod candidates;
mod cli;
mod config;
mod pipeline;
mod ranking;
mod report;
mod retry;
mod scraper;
mod storage;
mod types;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::config::AppConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.default_log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(&cli).await {
        Ok(()) => {
            info!("Run completed");
            std::process::exit(0);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = AppConfig::load_from(cli.config.as_deref())?;
    let report = pipeline::run(&config, &cli.packs).await?;
    info!(
        "Report '{}' updated at {} with {} packs",
        report.id,
        report.update_time.to_rfc3339(),
        report.season_pack.len()
    );
    Ok(())
}
