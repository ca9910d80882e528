//! RSS feed reader
//!
//! Fetches a show's feed and turns each `<item>` into an [`Episode`].

use reqwest::StatusCode;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Episode, EpisodeDuration};

/// Feed loading error types
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Feed request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Feed returned HTTP {0}")]
    Status(u16),

    #[error("Failed to parse feed: {0}")]
    ParseFailed(#[from] rss::Error),
}

/// Feed reader
#[derive(Debug, Clone)]
pub struct FeedReader {
    client: reqwest::Client,
}

impl Default for FeedReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedReader {
    pub fn new() -> Self {
        Self::with_client(
            reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        )
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Load the ordered episode list for a feed
    pub async fn load_episodes(&self, feed_url: &str) -> Result<Vec<Episode>, FeedError> {
        tracing::debug!(feed_url, "loading feed");

        let response = self.client.get(feed_url).send().await?;
        match response.status() {
            StatusCode::OK => {
                let body = response.bytes().await?;
                let episodes = parse_feed(&body)?;
                tracing::info!(feed_url, count = episodes.len(), "feed loaded");
                Ok(episodes)
            }
            status => Err(FeedError::Status(status.as_u16())),
        }
    }
}

/// Parse RSS XML into episodes, keeping feed order
pub fn parse_feed(xml: &[u8]) -> Result<Vec<Episode>, FeedError> {
    let channel = rss::Channel::read_from(xml)?;
    Ok(channel.items().iter().map(parse_item).collect())
}

fn parse_item(item: &rss::Item) -> Episode {
    let itunes = item.itunes_ext();

    let title = item
        .title()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled Episode")
        .to_string();

    let description = item
        .description()
        .or_else(|| itunes.and_then(|ext| ext.summary()))
        .map(clean_description)
        .unwrap_or_default();

    let audio_url = item
        .enclosure()
        .map(|enclosure| enclosure.url().trim())
        .filter(|url| !url.is_empty())
        .map(String::from);

    Episode {
        title,
        description,
        duration: EpisodeDuration::parse(itunes.and_then(|ext| ext.duration())),
        audio_url,
    }
}

/// Matches any markup tag in a description, compiled once
fn markup_tags() -> Option<&'static Regex> {
    static TAGS: OnceLock<Option<Regex>> = OnceLock::new();
    TAGS.get_or_init(|| {
        Regex::new(r"<[^>]*>")
            .map_err(|e| tracing::error!(error = %e, "markup pattern rejected"))
            .ok()
    })
    .as_ref()
}

/// Strip markup from a feed description and collapse whitespace
pub fn clean_description(raw: &str) -> String {
    let text = match markup_tags() {
        Some(tags) => tags.replace_all(raw, " "),
        None => raw.into(),
    };

    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
