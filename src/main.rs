// src/main.rs
mod config;
mod extractors;
mod feed;
mod ingest;
mod market;
mod storage;
mod utils;

use clap::Parser;
use config::Settings;
use feed::HttpFeedClient;
use ingest::Ingester;
use market::enricher::DEFAULT_EXCHANGE_SUFFIX;
use market::{PriceEnricher, YahooClient};
use std::path::PathBuf;
use utils::AppError;

/// Ingests large-shareholding report feeds into SQLite
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Feed URL to process (defaults to the built-in feed list)
    feed_url: Option<String>,

    /// SQLite database file (default: reports.db)
    #[arg(env = "HOLDING_REPORT_DB")]
    db_path: Option<PathBuf>,

    /// Exchange suffix appended to bare security codes for price lookups
    #[arg(long, default_value = DEFAULT_EXCHANGE_SUFFIX)]
    exchange_suffix: String,

    /// Store reports without looking up market prices
    #[arg(long)]
    no_prices: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging("info");

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::debug!("Starting with args: {:?}", args);

    let settings = Settings::new(args.feed_url, args.db_path)
        .with_exchange_suffix(&args.exchange_suffix)
        .with_prices(!args.no_prices);
    println!("Database file: {}", settings.db_path.display());

    // 3. Build collaborators
    let source = HttpFeedClient::new()
        .map_err(|e| AppError::Config(format!("Could not build feed client: {}", e)))?;

    let enricher = if settings.fetch_prices {
        match YahooClient::new() {
            Ok(client) => Some(PriceEnricher::new(client, &settings.exchange_suffix)),
            Err(e) => {
                tracing::warn!("Market data client unavailable, continuing without prices: {}", e);
                None
            }
        }
    } else {
        tracing::info!("Price lookups disabled");
        None
    };

    // 4. Process each feed
    let ingester = Ingester::new(source, enricher, settings.db_path.clone());
    let runs = ingester.run(&settings.feeds).await;

    let failures = runs.iter().filter(|run| run.result.is_err()).count();
    for run in &runs {
        match &run.result {
            Ok(summary) => println!("{}", summary),
            Err(e) => println!("{}: failed ({})", run.url, e),
        }
    }

    match storage::ReportStore::open(&settings.db_path).and_then(|store| store.count()) {
        Ok(total) => println!("{} reports stored in {}", total, settings.db_path.display()),
        Err(e) => tracing::warn!("Could not count stored reports: {}", e),
    }

    tracing::info!(
        "Processing finished. Feeds: {}, Failures: {}",
        runs.len(),
        failures
    );

    Ok(())
}
