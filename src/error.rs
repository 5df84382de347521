use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while talking to the GitHub API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider reported that the request quota is exhausted.
    #[error("rate limit exhausted")]
    RateLimited,

    /// The code search API refuses to serve results past its window.
    #[error("search result window exhausted")]
    SearchWindowExceeded,

    #[error("unexpected API status: {0}")]
    Status(StatusCode),

    #[error("malformed API response: {0}")]
    Malformed(&'static str),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
