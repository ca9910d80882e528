//! CLI Command Handlers
//!
//! Each handler takes its CLI args, the loaded config and an [`Output`], and
//! returns an [`ExitCode`].

use serde::Serialize;

use crate::api::{DirectoryClient, DirectoryError, FeedError, FeedReader};
use crate::cli::{validate_feed_url, EpisodesCmd, ExitCode, Output, SearchCmd};
use crate::config::Config;
use crate::models::{Episode, Show};

fn api_client(config: &Config) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .unwrap_or_default()
}

// =============================================================================
// Search Command
// =============================================================================

pub async fn search_cmd(cmd: SearchCmd, config: &Config, output: &Output) -> ExitCode {
    if cmd.query.trim().is_empty() {
        return output.error("Search query is empty", ExitCode::InvalidArgs);
    }

    let client = DirectoryClient::with_client(api_client(config), &config.directory_url)
        .limit(cmd.limit.unwrap_or(config.search_limit));

    output.info(format!("Searching for: {}", cmd.query));

    match client.search(&cmd.query).await {
        Ok(shows) => {
            if let Err(e) = output.print(&shows, || format_shows(&shows)) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => {
            let code = match e {
                DirectoryError::InvalidResponse(_) => ExitCode::Error,
                _ => ExitCode::NetworkError,
            };
            output.error(format!("Search failed: {}", e), code)
        }
    }
}

fn format_shows(shows: &[Show]) -> String {
    if shows.is_empty() {
        return "No shows found".to_string();
    }
    shows
        .iter()
        .map(|show| format!("{}\n    {}", show, show.feed_url))
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Episodes Command
// =============================================================================

/// Episode row for JSON output
#[derive(Debug, Serialize)]
struct EpisodeRow<'a> {
    title: &'a str,
    duration: String,
    duration_secs: u64,
    audio_url: Option<&'a str>,
}

impl<'a> From<&'a Episode> for EpisodeRow<'a> {
    fn from(episode: &'a Episode) -> Self {
        Self {
            title: &episode.title,
            duration: episode.duration.to_string(),
            duration_secs: episode.duration.seconds(),
            audio_url: episode.audio_url.as_deref(),
        }
    }
}

pub async fn episodes_cmd(cmd: EpisodesCmd, config: &Config, output: &Output) -> ExitCode {
    let feed_url = match validate_feed_url(&cmd.feed_url) {
        Ok(url) => url,
        Err(e) => return output.error(e, ExitCode::InvalidArgs),
    };

    let reader = FeedReader::with_client(api_client(config));
    output.info(format!("Loading feed: {}", feed_url));

    match reader.load_episodes(feed_url).await {
        Ok(mut episodes) => {
            if let Some(limit) = cmd.limit {
                episodes.truncate(limit);
            }
            let rows: Vec<EpisodeRow> = episodes.iter().map(EpisodeRow::from).collect();
            if let Err(e) = output.print(&rows, || format_episodes(&episodes)) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => {
            let code = match e {
                FeedError::ParseFailed(_) => ExitCode::Error,
                _ => ExitCode::NetworkError,
            };
            output.error(format!("Feed load failed: {}", e), code)
        }
    }
}

fn format_episodes(episodes: &[Episode]) -> String {
    if episodes.is_empty() {
        return "No episodes".to_string();
    }
    episodes
        .iter()
        .map(|episode| {
            let marker = if episode.is_playable() { " " } else { "!" };
            format!("{} {:>8}  {}", marker, episode.duration, episode.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
