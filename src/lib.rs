//! PodTUI - terminal podcast player
//!
//! Search a podcast directory, browse a show's episodes, and listen without
//! leaving the terminal.
//!
//! # Modules
//!
//! - `models` - Shows, episodes, durations, transport state machine
//! - `api` - Directory client and RSS feed reader
//! - `playback` - Fetch worker, playback engine, playback sessions
//! - `app` - View stack and navigation controller
//! - `dispatch` - Runs controller requests as background tasks
//! - `ui` - TUI rendering
//! - `config`, `logging`, `cli`, `commands` - Application plumbing

pub mod api;
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod models;
pub mod playback;
pub mod ui;

// Re-export commonly used types
pub use models::{Episode, EpisodeDuration, ListEntry, Show, TransportEvent, TransportState};

pub use api::{DirectoryClient, FeedReader};
pub use app::{App, AppEvent, Request, View, ViewKind, ViewStack};
pub use config::Config;
pub use playback::{FetchWorker, PlaybackEngine, PlaybackSession};
