//! Command line arguments for fc-price-ranker.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fc-price-ranker")]
#[command(version, about = "Scrape FC Online market prices and publish ranked packs", long_about = None)]
pub struct Cli {
    /// Config file (defaults to ./config.toml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only run the named pack (repeatable); all configured packs by default
    #[arg(short, long = "pack", value_name = "NAME")]
    pub packs: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Log filter used when RUST_LOG is unset
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "fc_price_ranker=debug"
        } else {
            "fc_price_ranker=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["fc-price-ranker"]);
        assert!(cli.config.is_none());
        assert!(cli.packs.is_empty());
        assert_eq!(cli.default_log_filter(), "fc_price_ranker=info");
    }

    #[test]
    fn test_repeated_packs_and_config() {
        let cli = Cli::parse_from([
            "fc-price-ranker",
            "--config",
            "prod.toml",
            "--pack",
            "ICON TM",
            "-p",
            "CU",
            "-v",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("prod.toml")));
        assert_eq!(cli.packs, vec!["ICON TM".to_string(), "CU".to_string()]);
        assert_eq!(cli.default_log_filter(), "fc_price_ranker=debug");
    }
}
