use clap::Parser;
use std::path::PathBuf;

/// GitHub code scraping CLI that searches code across GitHub, fetches every
/// matching file and saves it to local disk with rate-limit aware pacing.
#[derive(Parser)]
#[clap(
    author,
    version,
    about,
    long_about = "Searches GitHub code for a query, fetches each matching file on its repository's default branch and writes the raw bytes to an output directory, sleeping through API rate-limit windows instead of failing."
)]
pub struct Args {
    /// GitHub code search query.
    #[clap(short, long, default_value = "apiVersion kind language:YAML")]
    pub query: String,

    /// Directory downloaded files are written into.
    #[clap(short, long, default_value = "scraped_files")]
    pub output: PathBuf,

    /// Maximum number of files to save. The code search API stops serving
    /// results after the first 1000 regardless of this value.
    #[clap(short, long, default_value_t = 1000)]
    pub max_files: u32,

    /// Save every file directly into the output directory under a
    /// synthesized unique name instead of a repository/path tree.
    #[clap(long)]
    pub flat: bool,

    /// GitHub API token. Falls back to the GITHUB_TOKEN environment variable.
    #[clap(short, long)]
    pub token: Option<String>,

    /// GitHub API base URL, overridable for GitHub Enterprise deployments.
    #[clap(long, default_value = "https://api.github.com")]
    pub api_url: String,

    /// Enable debug logging.
    #[clap(long)]
    pub debug: bool,
}
