//! Boundary records between the GitHub API payloads and the download loop.
//!
//! The wire types mirror only the fields the scraper reads; the rest of the
//! payload is ignored during deserialization.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

/// One page of code search matches.
/// `GET /search/code?q={query}&page={n}&per_page=100`
#[derive(Debug, Deserialize)]
pub struct CodeSearchResponse {
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<CodeSearchItem>,
}

/// A single code search match.
#[derive(Debug, Deserialize)]
pub struct CodeSearchItem {
    pub path: String,
    pub repository: RepositorySummary,
}

/// Subset of the repository object embedded in a search match. The search
/// payload does not always carry the default branch; it is resolved with a
/// separate repository lookup when absent.
#[derive(Debug, Deserialize)]
pub struct RepositorySummary {
    pub full_name: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Response from the contents API for a single file.
/// `GET /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Deserialize)]
pub struct ContentEntry {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl ContentEntry {
    /// Decode the payload into raw file bytes. GitHub line-wraps the base64
    /// body, so whitespace is stripped before decoding. Returns `None` when
    /// there is no content, the encoding is not base64, or the body does not
    /// decode.
    pub fn decoded_bytes(&self) -> Option<Vec<u8>> {
        let raw = self.content.as_deref()?;
        if self.encoding.as_deref() != Some("base64") {
            return None;
        }
        let compact: String = raw.split_whitespace().collect();
        BASE64.decode(compact).ok()
    }
}

/// A search match reduced to the fields the download loop needs, decoupled
/// from the provider's payload shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// `owner/name` identifier of the repository holding the match.
    pub repository: String,
    /// Path of the matched file within the repository.
    pub path: String,
    /// Default branch, when the search payload carried it.
    pub default_branch: Option<String>,
}

impl From<CodeSearchItem> for SearchResult {
    fn from(item: CodeSearchItem) -> Self {
        SearchResult {
            repository: item.repository.full_name,
            path: item.path,
            default_branch: item.repository.default_branch,
        }
    }
}

/// File bytes resolved for a search result. `bytes` is absent when the
/// provider returned nothing usable for the path.
#[derive(Debug, Clone)]
pub struct FileContent {
    pub result: SearchResult,
    pub bytes: Option<Vec<u8>>,
}

/// Running totals for a single scrape. `saved` can never exceed `processed`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadCounter {
    /// Search results examined, whether or not they produced a file.
    pub processed: u64,
    /// Files successfully written to disk.
    pub saved: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_line_wrapped_base64() {
        let entry = ContentEntry {
            content: Some("a2luZDogUG9k\nbWV0YWRhdGE6\n".to_string()),
            encoding: Some("base64".to_string()),
        };
        assert_eq!(entry.decoded_bytes().unwrap(), b"kind: Podmetadata:");
    }

    #[test]
    fn missing_content_yields_none() {
        let entry = ContentEntry {
            content: None,
            encoding: Some("base64".to_string()),
        };
        assert!(entry.decoded_bytes().is_none());
    }

    #[test]
    fn unknown_encoding_yields_none() {
        // Files over the API size cutoff come back with encoding "none".
        let entry = ContentEntry {
            content: Some(String::new()),
            encoding: Some("none".to_string()),
        };
        assert!(entry.decoded_bytes().is_none());
    }

    #[test]
    fn invalid_base64_yields_none() {
        let entry = ContentEntry {
            content: Some("not base64 at all!!".to_string()),
            encoding: Some("base64".to_string()),
        };
        assert!(entry.decoded_bytes().is_none());
    }

    #[test]
    fn search_item_converts_to_search_result() {
        let response: CodeSearchResponse = serde_json::from_value(json!({
            "total_count": 2,
            "items": [
                {
                    "path": "deploy/app.yaml",
                    "repository": { "full_name": "octo/demo", "default_branch": "main" }
                },
                {
                    "path": "config.yaml",
                    "repository": { "full_name": "octo/legacy" }
                }
            ]
        }))
        .unwrap();

        assert_eq!(response.total_count, 2);
        let results: Vec<SearchResult> =
            response.items.into_iter().map(SearchResult::from).collect();
        assert_eq!(results[0].repository, "octo/demo");
        assert_eq!(results[0].path, "deploy/app.yaml");
        assert_eq!(results[0].default_branch.as_deref(), Some("main"));
        assert_eq!(results[1].default_branch, None);
    }
}
