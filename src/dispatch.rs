//! Background request dispatcher
//!
//! Runs the controller's [`Request`]s as tokio tasks and posts the results
//! back as [`AppEvent`]s. In-flight downloads are tracked by session id so
//! a closed detail view can abort its fetch; aborting drops the partial
//! temporary file with the task.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::{DirectoryClient, FeedReader};
use crate::app::{AppEvent, Request};
use crate::config::Config;
use crate::playback::FetchWorker;

pub struct Dispatcher {
    directory: DirectoryClient,
    feeds: FeedReader,
    fetcher: FetchWorker,
    events: UnboundedSender<AppEvent>,
    downloads: HashMap<Uuid, JoinHandle<()>>,
}

impl Dispatcher {
    pub fn new(
        directory: DirectoryClient,
        feeds: FeedReader,
        fetcher: FetchWorker,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            directory,
            feeds,
            fetcher,
            events,
            downloads: HashMap::new(),
        }
    }

    /// Build the directory, feed and fetch components from config
    pub fn from_config(config: &Config, events: UnboundedSender<AppEvent>) -> Self {
        let api_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_default();
        // Episodes can be large; only the connection attempt is bounded
        let download_client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout())
            .read_timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self::new(
            DirectoryClient::with_client(api_client.clone(), &config.directory_url)
                .limit(config.search_limit),
            FeedReader::with_client(api_client),
            FetchWorker::new(download_client, config.download_dir()),
            events,
        )
    }

    pub fn dispatch(&mut self, request: Request) {
        match request {
            Request::Search { generation, query } => {
                let directory = self.directory.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let result = directory.search(&query).await;
                    send(&events, AppEvent::SearchFinished { generation, result });
                });
            }
            Request::LoadEpisodes { view_id, feed_url } => {
                let feeds = self.feeds.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let result = feeds.load_episodes(&feed_url).await;
                    send(&events, AppEvent::EpisodesLoaded { view_id, result });
                });
            }
            Request::Fetch(order) => {
                self.downloads.retain(|_, handle| !handle.is_finished());

                let fetcher = self.fetcher.clone();
                let events = self.events.clone();
                let session_id = order.session_id;
                let handle = tokio::spawn(async move {
                    let result = fetcher.fetch(&order.url).await;
                    send(&events, AppEvent::FetchFinished { session_id, result });
                });
                if let Some(previous) = self.downloads.insert(session_id, handle) {
                    previous.abort();
                }
            }
            Request::CancelFetch { session_id } => {
                if let Some(handle) = self.downloads.remove(&session_id) {
                    tracing::info!(%session_id, "download cancelled");
                    handle.abort();
                }
            }
        }
    }

    /// Number of downloads still running
    pub fn downloads_in_flight(&self) -> usize {
        self.downloads.values().filter(|h| !h.is_finished()).count()
    }

    /// Abort every running download (on quit)
    pub fn abort_all(&mut self) {
        for (session_id, handle) in self.downloads.drain() {
            tracing::debug!(%session_id, "download aborted");
            handle.abort();
        }
    }
}

fn send(events: &UnboundedSender<AppEvent>, event: AppEvent) {
    if events.send(event).is_err() {
        // Receiver gone means the UI loop has exited; a fetched TempPath is
        // dropped here and removes its file
        tracing::debug!("event loop closed, result dropped");
    }
}
