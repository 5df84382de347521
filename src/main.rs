use clap::Parser;
use dotenv::dotenv;
use std::error::Error;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use github_code_scraper_lib::{Args, GitHubScraper};

/// Log lines go to stdout and to this file, in append mode.
const LOG_FILE: &str = "scraper.log";

fn init_logging(debug: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE)?;
    let level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    tracing_subscriber::registry()
        .with(level)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(log_file)),
        )
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();

    let args = Args::parse();
    init_logging(args.debug)?;

    info!("Starting code search with query: '{}'", args.query);
    info!("Output directory: {}", args.output.display());
    info!("Maximum files to download: {}", args.max_files);
    if args.flat {
        info!("Using flat directory structure for saving files.");
    } else {
        info!("Using repository/path structure for saving files.");
    }

    let scraper = GitHubScraper::new(&args).await?;
    scraper.verify_auth().await?;
    let counts = scraper.run().await?;

    info!(
        "Pipeline finished: processed {} items, saved {} files.",
        counts.processed, counts.saved
    );
    Ok(())
}
