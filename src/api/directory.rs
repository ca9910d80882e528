//! Podcast directory client
//!
//! Searches an iTunes-compatible directory for shows.
//! API docs: https://performance-partners.apple.com/search-api

use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::Show;

/// Default directory endpoint
pub const DEFAULT_DIRECTORY_URL: &str = "https://itunes.apple.com";

/// Default number of shows requested per search
pub const DEFAULT_SEARCH_LIMIT: u32 = 25;

/// Directory API error types
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Search request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Directory returned HTTP {0}")]
    Status(u16),

    #[error("Invalid directory response: {0}")]
    InvalidResponse(String),
}

/// Podcast directory client
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    base_url: String,
    client: reqwest::Client,
    limit: u32,
}

impl Default for DirectoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryClient {
    /// Create a client for the public directory
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_DIRECTORY_URL)
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::with_client(
            reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url,
        )
    }

    /// Create a client sharing an existing reqwest client
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Cap the number of shows requested per search
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Search for shows matching `query`.
    ///
    /// Blank queries return an empty list without touching the network.
    /// Results keep the directory's order; entries without a title or feed
    /// URL are dropped.
    pub async fn search(&self, query: &str) -> Result<Vec<Show>, DirectoryError> {
        let term = query.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/search?term={}&media=podcast&entity=podcast&limit={}",
            self.base_url,
            urlencoding::encode(term),
            self.limit
        );

        tracing::debug!(term, "directory search");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| {
                    DirectoryError::InvalidResponse(format!("JSON parse error: {}", e))
                })?;
                let shows = parsed.into_shows();
                tracing::info!(term, count = shows.len(), "directory search finished");
                Ok(shows)
            }
            status => Err(DirectoryError::Status(status.as_u16())),
        }
    }
}

// =============================================================================
// Response Structures (internal deserialization)
// =============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ShowRaw>,
}

impl SearchResponse {
    fn into_shows(self) -> Vec<Show> {
        self.results
            .into_iter()
            .filter_map(ShowRaw::into_show)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShowRaw {
    collection_name: Option<String>,
    feed_url: Option<String>,
    description: Option<String>,
    artist_name: Option<String>,
}

impl ShowRaw {
    fn into_show(self) -> Option<Show> {
        let title = non_blank(self.collection_name)?;
        let feed_url = non_blank(self.feed_url)?;
        // The search API rarely carries a description for podcasts
        let description = non_blank(self.description).unwrap_or_else(|| title.clone());

        Some(Show {
            title,
            feed_url,
            description,
            author: non_blank(self.artist_name),
            episodes: Vec::new(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
