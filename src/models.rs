//! Data structures shared across PodTUI
//!
//! Organized by domain:
//! - **Directory**: shows returned by a podcast search
//! - **Feed**: episodes listed in a show's RSS feed
//! - **Playback**: transport state machine for a playback session
//! - **Selection**: tagged list entries used to dispatch a selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// =============================================================================
// Directory Models
// =============================================================================

/// A podcast series, identified by its feed location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub title: String,
    pub feed_url: String,
    pub description: String,
    /// Publisher name when the directory reports one
    pub author: Option<String>,
    /// Empty until explicitly loaded from the feed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub episodes: Vec<Episode>,
}

impl Show {
    pub fn new(
        title: impl Into<String>,
        feed_url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            feed_url: feed_url.into(),
            description: description.into(),
            author: None,
            episodes: Vec::new(),
        }
    }

    /// Replace the episode list wholesale (loads and refreshes never merge)
    pub fn replace_episodes(&mut self, episodes: Vec<Episode>) {
        self.episodes = episodes;
    }

    pub fn episodes_loaded(&self) -> bool {
        !self.episodes.is_empty()
    }
}

impl fmt::Display for Show {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.author {
            Some(author) => write!(f, "{} ({})", self.title, author),
            None => write!(f, "{}", self.title),
        }
    }
}

// =============================================================================
// Feed Models
// =============================================================================

/// One audio item belonging to a show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub title: String,
    pub description: String,
    pub duration: EpisodeDuration,
    /// Enclosure URL; `None` means the episode cannot be played
    pub audio_url: Option<String>,
}

impl Episode {
    pub fn new(title: impl Into<String>, audio_url: Option<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            duration: EpisodeDuration::Unknown,
            audio_url,
        }
    }

    pub fn is_playable(&self) -> bool {
        self.audio_url.is_some()
    }
}

/// Normalized episode length
///
/// Feeds report durations as plain seconds, `MM:SS`, `HH:MM:SS`, or not at
/// all. Anything that does not parse to a positive length is `Unknown`, which
/// consumers must never treat as a zero-length episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeDuration {
    #[default]
    Unknown,
    Known(Duration),
}

impl EpisodeDuration {
    /// Parse a raw duration field from a feed
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return EpisodeDuration::Unknown;
        };

        let seconds = if raw.contains(':') {
            parse_clock(raw)
        } else {
            raw.parse::<f64>()
                .ok()
                .filter(|s| s.is_finite() && *s >= 0.0)
                .map(|s| s as u64)
        };

        match seconds {
            Some(secs) if secs > 0 => EpisodeDuration::Known(Duration::from_secs(secs)),
            _ => EpisodeDuration::Unknown,
        }
    }

    /// Numeric seconds, with 0 standing in for "unknown"
    pub fn seconds(&self) -> u64 {
        match self {
            EpisodeDuration::Known(d) => d.as_secs(),
            EpisodeDuration::Unknown => 0,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            EpisodeDuration::Known(d) => Some(*d),
            EpisodeDuration::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, EpisodeDuration::Known(_))
    }
}

impl fmt::Display for EpisodeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Honors width and alignment flags
        match self {
            EpisodeDuration::Known(d) => f.pad(&format_clock(d.as_secs())),
            EpisodeDuration::Unknown => f.pad("--:--"),
        }
    }
}

/// Longest episode length accepted from a feed (one year)
const MAX_CLOCK_SECS: u64 = 365 * 24 * 3600;

/// Parse `SS`, `MM:SS` or `HH:MM:SS` into seconds
fn parse_clock(raw: &str) -> Option<u64> {
    let parts: Vec<&str> = raw.split(':').map(str::trim).collect();
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }

    let total = parts.iter().try_fold(0u64, |acc, part| {
        // Seconds may carry a fractional part ("12:30.5")
        let value = part
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0 && *v <= MAX_CLOCK_SECS as f64)?;
        acc.checked_mul(60)?.checked_add(value as u64)
    })?;

    (total <= MAX_CLOCK_SECS).then_some(total)
}

/// Format seconds as HH:MM:SS or MM:SS
pub fn format_clock(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Playback progress in 0.0..=1.0, or `None` when the length is unknown
pub fn progress_ratio(elapsed: Duration, total: EpisodeDuration) -> Option<f64> {
    let total = total.as_duration()?.as_secs_f64();
    if total <= 0.0 {
        return None;
    }
    Some((elapsed.as_secs_f64() / total).clamp(0.0, 1.0))
}

// =============================================================================
// Playback Models
// =============================================================================

/// Phase of a playback session's audio lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    #[default]
    Idle,
    Downloading,
    Ready,
    Playing,
    Paused,
    Stopped,
    Failed,
}

/// Inputs that drive the transport state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// User pressed Play
    Play,
    /// User pressed Play on an episode without audio
    Unplayable,
    FetchSucceeded,
    FetchFailed,
    /// Audio output started after the resource became ready
    Started,
    Pause,
    Resume,
    Stop,
    /// Elapsed time reached the known duration or the output drained
    Finished,
    DeviceFailed,
}

impl TransportState {
    /// Next state for `event`, or `None` when the event does not apply.
    ///
    /// `resource_present` tells whether the downloaded file is still held by
    /// the session, which decides between re-downloading and replaying.
    pub fn next(self, event: TransportEvent, resource_present: bool) -> Option<TransportState> {
        use TransportEvent as E;
        use TransportState as S;

        match (self, event) {
            (S::Idle | S::Stopped | S::Failed, E::Play) => Some(if resource_present {
                S::Ready
            } else {
                S::Downloading
            }),
            (S::Idle | S::Stopped | S::Failed, E::Unplayable) => Some(S::Failed),
            (S::Downloading, E::FetchSucceeded) => Some(S::Ready),
            (S::Downloading, E::FetchFailed) => Some(S::Failed),
            (S::Ready, E::Started) => Some(S::Playing),
            (S::Playing, E::Pause) => Some(S::Paused),
            (S::Paused, E::Resume | E::Play) => Some(S::Playing),
            (S::Playing, E::Finished) => Some(S::Stopped),
            (S::Playing | S::Paused, E::Stop) => Some(S::Stopped),
            (S::Ready | S::Playing | S::Paused, E::DeviceFailed) => Some(S::Failed),
            _ => None,
        }
    }

    /// Whether elapsed time is meaningful in this state
    pub fn has_position(&self) -> bool {
        matches!(self, TransportState::Playing | TransportState::Paused)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransportState::Idle => "Idle",
            TransportState::Downloading => "Downloading",
            TransportState::Ready => "Ready",
            TransportState::Playing => "Playing",
            TransportState::Paused => "Paused",
            TransportState::Stopped => "Stopped",
            TransportState::Failed => "Failed",
        }
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// =============================================================================
// Selection
// =============================================================================

/// A selected list row, tagged with the kind of item it holds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListEntry<'a> {
    Show(&'a Show),
    Episode(&'a Episode),
}

impl ListEntry<'_> {
    pub fn title(&self) -> &str {
        match self {
            ListEntry::Show(show) => &show.title,
            ListEntry::Episode(episode) => &episode.title,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
