use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::env;
use std::error::Error;
use std::path::PathBuf;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use crate::error::FetchError;
use crate::models::{CodeSearchResponse, ContentEntry, DownloadCounter, FileContent, SearchResult};
use crate::{saver, Args};

/// The code search API stops serving results past the first thousand, no
/// matter how large `total_count` is.
const SEARCH_RESULT_WINDOW: u64 = 1000;

/// Results requested per search page.
const RESULTS_PER_PAGE: u32 = 100;

/// Extra seconds slept past the advertised rate-limit reset time.
const RATE_LIMIT_MARGIN_SECS: u64 = 5;

const USER_AGENT: &str = "github-code-scraper";

/// Outcome of resolving a search result's file content.
enum Resolution {
    /// The path resolved to a file; `bytes` may still be absent when the
    /// payload was unusable.
    Content(FileContent),
    /// The path resolved to a directory listing.
    Directory,
}

pub struct GitHubScraper {
    client: Client,
    token: String,
    api_url: String,
    query: String,
    output_dir: PathBuf,
    max_files: u32,
    flat: bool,
}

impl GitHubScraper {
    /// Create a new GitHubScraper instance
    pub async fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        // Get GitHub API token from arguments or environment
        let token = match &args.token {
            Some(t) if !t.trim().is_empty() => t.clone(),
            _ => match env::var("GITHUB_TOKEN") {
                Ok(token) if !token.trim().is_empty() => token,
                _ => {
                    error!("GitHub token not provided or found in environment");
                    return Err("GitHub token is required".into());
                }
            },
        };

        // Create HTTP client
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(GitHubScraper {
            client,
            token,
            api_url: args.api_url.trim_end_matches('/').to_string(),
            query: args.query.clone(),
            output_dir: args.output.clone(),
            max_files: args.max_files,
            flat: args.flat,
        })
    }

    /// Confirm the token works and report the current rate-limit budget.
    /// Called once before any search traffic; failure here aborts the run.
    pub async fn verify_auth(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let url = format!("{}/user", self.api_url);
        let response = self.api_get(&url).send().await?;
        if !response.status().is_success() {
            error!(
                "Failed to authenticate against {}: {}",
                self.api_url,
                response.status()
            );
            return Err(format!("GitHub authentication failed: {}", response.status()).into());
        }
        let user: Value = response.json().await?;
        info!(
            "Authenticated as GitHub user: {}",
            user["login"].as_str().unwrap_or("<unknown>")
        );

        if let Some(limits) = self.rate_limit_snapshot().await {
            let core = &limits["resources"]["core"];
            let search = &limits["resources"]["search"];
            info!(
                "Core rate limit: {}/{} remaining",
                core["remaining"], core["limit"]
            );
            info!(
                "Search rate limit: {}/{} remaining",
                search["remaining"], search["limit"]
            );
            let core_remaining = core["remaining"].as_u64().unwrap_or(u64::MAX);
            let search_remaining = search["remaining"].as_u64().unwrap_or(u64::MAX);
            if core_remaining < 50 || search_remaining < 5 {
                warn!("Rate limit low. Consider waiting before running.");
            }
        }
        Ok(())
    }

    /// Run the fetch-and-save loop: search once, then resolve and save each
    /// result until the configured maximum, the search window or the result
    /// sequence runs out.
    pub async fn run(&self) -> Result<DownloadCounter, Box<dyn Error + Send + Sync>> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let first = match self.search_page(1).await {
            Ok(first) => first,
            Err(e) => {
                error!("Initial code search failed: {}", e);
                return Err(e.into());
            }
        };

        let window = first.total_count.min(SEARCH_RESULT_WINDOW);
        let iteration_limit = window.min(u64::from(self.max_files));
        info!(
            "Found {} potential results (API limits iteration to first {})",
            first.total_count, window
        );

        let pb = ProgressBar::new(iteration_limit);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {wide_msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        let mut counter = DownloadCounter::default();
        let mut page: u32 = 1;
        let mut items = first.items.into_iter();

        loop {
            if counter.saved >= u64::from(self.max_files) {
                info!(
                    "Reached the download limit of {} files. Stopping iteration.",
                    self.max_files
                );
                break;
            }
            if counter.processed >= iteration_limit {
                info!(
                    "Processed {} items, reaching the iteration limit. Stopping.",
                    counter.processed
                );
                break;
            }

            let item = match items.next() {
                Some(item) => item,
                None => {
                    page += 1;
                    let next = loop {
                        match self.search_page(page).await {
                            Err(FetchError::RateLimited) => self.wait_for_reset().await,
                            other => break other,
                        }
                    };
                    match next {
                        Ok(next) if next.items.is_empty() => {
                            info!("No more results.");
                            break;
                        }
                        Ok(next) => {
                            items = next.items.into_iter();
                            continue;
                        }
                        Err(FetchError::SearchWindowExceeded) => {
                            warn!("Code search stopped serving results at page {}.", page);
                            break;
                        }
                        Err(e) => {
                            error!("Search for page {} failed: {}. Stopping iteration.", page, e);
                            break;
                        }
                    }
                }
            };

            let result = SearchResult::from(item);
            counter.processed += 1;
            pb.set_message(result.repository.clone());

            match self.resolve_content(&result).await {
                Ok(Resolution::Directory) => {
                    warn!(
                        "Path {}/{} is a directory, not a file. Skipping.",
                        result.repository, result.path
                    );
                }
                Ok(Resolution::Content(content)) => {
                    if let Some(bytes) = &content.bytes {
                        match saver::save_file(&content.result, bytes, &self.output_dir, self.flat)
                            .await
                        {
                            Ok(dest) => {
                                counter.saved += 1;
                                info!("Successfully saved: {}", dest.display());
                            }
                            Err(e) => {
                                error!(
                                    "Failed to write file for {}/{}: {}",
                                    content.result.repository, content.result.path, e
                                );
                            }
                        }
                    }
                }
                Err(FetchError::RateLimited) => {
                    warn!(
                        "Rate limit hit while fetching {}/{}.",
                        result.repository, result.path
                    );
                    self.wait_for_reset().await;
                }
                Err(e) => {
                    error!(
                        "Error processing {}/{}: {}. Skipping.",
                        result.repository, result.path, e
                    );
                }
            }

            pb.inc(1);
        }

        pb.finish_and_clear();
        info!(
            "Search finished. Processed {} items from search results, successfully downloaded {} files.",
            counter.processed, counter.saved
        );
        Ok(counter)
    }

    /// Fetch one page of code search results.
    async fn search_page(&self, page: u32) -> Result<CodeSearchResponse, FetchError> {
        let url = format!("{}/search/code", self.api_url);
        debug!("Requesting {} page {}", url, page);
        let response = self
            .api_get(&url)
            .query(&[
                ("q", self.query.as_str()),
                ("page", &page.to_string()),
                ("per_page", &RESULTS_PER_PAGE.to_string()),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(FetchError::SearchWindowExceeded);
        }
        if Self::rate_limited(&response) {
            return Err(FetchError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    /// Resolve a search result to file bytes on its repository's default
    /// branch.
    async fn resolve_content(&self, result: &SearchResult) -> Result<Resolution, FetchError> {
        let branch = match &result.default_branch {
            Some(branch) => branch.clone(),
            None => self.default_branch_for(&result.repository).await?,
        };

        let url = format!(
            "{}/repos/{}/contents/{}",
            self.api_url, result.repository, result.path
        );
        debug!("Fetching {} from branch '{}'", url, branch);
        let response = self
            .api_get(&url)
            .query(&[("ref", branch.as_str())])
            .send()
            .await?;

        if Self::rate_limited(&response) {
            return Err(FetchError::RateLimited);
        }
        if response.status() == StatusCode::NOT_FOUND {
            warn!(
                "Content not found for {}/{} on branch '{}'. Skipping.",
                result.repository, result.path, branch
            );
            return Ok(Resolution::Content(FileContent {
                result: result.clone(),
                bytes: None,
            }));
        }
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let json: Value = response.json().await?;
        // The contents API answers with an array when the path is a
        // directory rather than a file.
        if json.is_array() {
            return Ok(Resolution::Directory);
        }

        let entry: ContentEntry = serde_json::from_value(json)?;
        let bytes = if entry.content.is_none() {
            warn!(
                "Content is empty for {}/{}. Skipping save.",
                result.repository, result.path
            );
            None
        } else {
            match entry.decoded_bytes() {
                Some(bytes) => Some(bytes),
                None => {
                    warn!(
                        "Could not decode content for {}/{}. Skipping save.",
                        result.repository, result.path
                    );
                    None
                }
            }
        };

        Ok(Resolution::Content(FileContent {
            result: result.clone(),
            bytes,
        }))
    }

    /// Look up a repository's default branch when the search payload did not
    /// carry it.
    async fn default_branch_for(&self, repository: &str) -> Result<String, FetchError> {
        let url = format!("{}/repos/{}", self.api_url, repository);
        debug!("Resolving default branch via {}", url);
        let response = self.api_get(&url).send().await?;
        if Self::rate_limited(&response) {
            return Err(FetchError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        let json: Value = response.json().await?;
        json.get("default_branch")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(FetchError::Malformed("repository payload missing default_branch"))
    }

    /// Ask the provider for its reset timestamp and sleep until then, plus a
    /// small safety margin. Falls back to a fixed wait when the timestamp
    /// cannot be obtained.
    async fn wait_for_reset(&self) {
        let now = Utc::now().timestamp().max(0) as u64;
        let reset = self
            .rate_limit_snapshot()
            .await
            .and_then(|limits| limits["resources"]["core"]["reset"].as_u64())
            .unwrap_or(now + 60);
        let wait_secs = reset.saturating_sub(now) + RATE_LIMIT_MARGIN_SECS;
        warn!("Rate limit exceeded. Sleeping for {} seconds...", wait_secs);
        sleep(Duration::from_secs(wait_secs)).await;
        info!("Resuming after rate limit pause.");
    }

    async fn rate_limit_snapshot(&self) -> Option<Value> {
        let url = format!("{}/rate_limit", self.api_url);
        let response = self.api_get(&url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json().await.ok()
    }

    fn api_get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    fn rate_limited(response: &reqwest::Response) -> bool {
        if response.status() != StatusCode::FORBIDDEN
            && response.status() != StatusCode::TOO_MANY_REQUESTS
        {
            return false;
        }
        response
            .headers()
            .get("X-RateLimit-Remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok())
            .map(|remaining| remaining == 0)
            .unwrap_or(false)
    }
}
