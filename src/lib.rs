//! # GitHub Code Scraper
//!
//! A Rust library for searching code on GitHub and saving every matching
//! file to local disk, with rate-limit handling and progress visualization.
//!
//! ## Main Components
//!
//! - [`GitHubScraper`]: The core component that searches, fetches and saves
//! - [`Args`]: Command line argument structure for configuring a run
//! - [`models`]: Value records exchanged between the API boundary and the
//!   download loop
//!
//! ## Example
//!
//! ```no_run
//! use github_code_scraper_lib::{Args, GitHubScraper};
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     // Parse command line arguments
//!     let args = Args::parse();
//!
//!     // Initialize the scraper and confirm the token works
//!     let scraper = GitHubScraper::new(&args).await?;
//!     scraper.verify_auth().await?;
//!
//!     // Search and download matching files
//!     let counts = scraper.run().await?;
//!     println!("saved {} of {} processed", counts.saved, counts.processed);
//!
//!     Ok(())
//! }
//! ```

mod args;
mod error;
mod github_scraper;
pub mod models;
pub mod saver;

// Re-export main components for documentation and external use
pub use crate::args::Args;
pub use crate::error::FetchError;
pub use crate::github_scraper::GitHubScraper;
pub use crate::models::DownloadCounter;
