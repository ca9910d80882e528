//! Playback session
//!
//! One session exists per opened episode detail view. It owns the transport
//! state, the downloaded file, and drives the [`PlaybackEngine`]. The
//! download itself runs elsewhere; the session only asks for it (returning a
//! [`FetchOrder`]) and later consumes the result.

use std::path::Path;
use std::time::Duration;

use tempfile::TempPath;
use thiserror::Error;
use uuid::Uuid;

use super::engine::{PlaybackEngine, PlaybackError};
use super::fetch::{discard, FetchError};
use crate::models::{Episode, TransportEvent, TransportState};

/// Failures surfaced to the user; the session is already `Failed` when returned
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("This episode has no audio to play")]
    NoAudio,
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// Request to download the session's audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOrder {
    pub session_id: Uuid,
    pub url: String,
}

/// Transport state and local resource for one episode
#[derive(Debug)]
pub struct PlaybackSession {
    id: Uuid,
    episode: Episode,
    state: TransportState,
    history: Vec<TransportState>,
    local: Option<TempPath>,
    elapsed: Duration,
    error: Option<String>,
}

impl PlaybackSession {
    pub fn new(episode: Episode) -> Self {
        Self {
            id: Uuid::new_v4(),
            episode,
            state: TransportState::Idle,
            history: vec![TransportState::Idle],
            local: None,
            elapsed: Duration::ZERO,
            error: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Every state this session has passed through, oldest first
    pub fn history(&self) -> &[TransportState] {
        &self.history
    }

    pub fn is_fetching(&self) -> bool {
        self.state == TransportState::Downloading
    }

    pub fn local_path(&self) -> Option<&Path> {
        self.local.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Elapsed playback time, only meaningful while playing or paused
    pub fn elapsed(&self) -> Option<Duration> {
        self.state.has_position().then_some(self.elapsed)
    }

    fn apply(&mut self, event: TransportEvent) -> bool {
        match self.state.next(event, self.local.is_some()) {
            Some(next) => {
                tracing::debug!(
                    session = %self.id,
                    from = %self.state,
                    to = %next,
                    ?event,
                    "transport transition"
                );
                self.state = next;
                self.history.push(next);
                if next != TransportState::Failed {
                    self.error = None;
                }
                true
            }
            None => {
                tracing::trace!(session = %self.id, state = %self.state, ?event, "event ignored");
                false
            }
        }
    }

    fn fail(&mut self, event: TransportEvent, error: SessionError) -> SessionError {
        self.apply(event);
        tracing::warn!(session = %self.id, error = %error, "playback session failed");
        self.error = Some(error.to_string());
        error
    }

    /// User pressed Play.
    ///
    /// Returns a fetch order when the audio has to be downloaded first.
    /// Pressing Play while downloading or playing does nothing.
    pub fn play(&mut self, engine: &mut PlaybackEngine) -> Result<Option<FetchOrder>, SessionError> {
        match self.state {
            TransportState::Playing | TransportState::Downloading => Ok(None),
            TransportState::Paused => {
                self.resume(engine)?;
                Ok(None)
            }
            TransportState::Ready => {
                self.start(engine)?;
                Ok(None)
            }
            TransportState::Idle | TransportState::Stopped | TransportState::Failed => {
                if self.local.is_some() {
                    self.apply(TransportEvent::Play);
                    self.start(engine)?;
                    return Ok(None);
                }

                let Some(url) = self.episode.audio_url.clone() else {
                    return Err(self.fail(TransportEvent::Unplayable, SessionError::NoAudio));
                };

                self.apply(TransportEvent::Play);
                Ok(Some(FetchOrder {
                    session_id: self.id,
                    url,
                }))
            }
        }
    }

    /// Consume the download result and start playback on success.
    ///
    /// Results arriving outside `Downloading` are stale and discarded.
    pub fn fetch_completed(
        &mut self,
        result: Result<TempPath, FetchError>,
        engine: &mut PlaybackEngine,
    ) -> Result<(), SessionError> {
        if self.state != TransportState::Downloading {
            tracing::debug!(session = %self.id, state = %self.state, "late fetch result dropped");
            if let Ok(path) = result {
                discard(path);
            }
            return Ok(());
        }

        match result {
            Ok(path) => {
                if let Some(previous) = self.local.replace(path) {
                    discard(previous);
                }
                self.apply(TransportEvent::FetchSucceeded);
                self.start(engine)
            }
            Err(e) => Err(self.fail(TransportEvent::FetchFailed, e.into())),
        }
    }

    /// Ready -> Playing: load the local file and start output
    fn start(&mut self, engine: &mut PlaybackEngine) -> Result<(), SessionError> {
        let Some(path) = self.local.as_deref() else {
            return Err(self.fail(TransportEvent::DeviceFailed, PlaybackError::NotLoaded.into()));
        };

        if let Err(e) = engine.load(path).and_then(|()| engine.play()) {
            engine.stop();
            return Err(self.fail(TransportEvent::DeviceFailed, e.into()));
        }

        self.elapsed = Duration::ZERO;
        self.apply(TransportEvent::Started);
        Ok(())
    }

    pub fn pause(&mut self, engine: &mut PlaybackEngine) -> Result<(), SessionError> {
        if self.state != TransportState::Playing {
            return Ok(());
        }
        if let Err(e) = engine.pause() {
            engine.stop();
            return Err(self.fail(TransportEvent::DeviceFailed, e.into()));
        }
        self.elapsed = engine.elapsed();
        self.apply(TransportEvent::Pause);
        Ok(())
    }

    pub fn resume(&mut self, engine: &mut PlaybackEngine) -> Result<(), SessionError> {
        if self.state != TransportState::Paused {
            return Ok(());
        }
        if let Err(e) = engine.resume() {
            engine.stop();
            return Err(self.fail(TransportEvent::DeviceFailed, e.into()));
        }
        self.apply(TransportEvent::Resume);
        Ok(())
    }

    /// Play/Pause toggle
    pub fn toggle(&mut self, engine: &mut PlaybackEngine) -> Result<Option<FetchOrder>, SessionError> {
        match self.state {
            TransportState::Playing => self.pause(engine).map(|()| None),
            _ => self.play(engine),
        }
    }

    /// Stop output and release the device; the downloaded file is kept
    pub fn stop(&mut self, engine: &mut PlaybackEngine) {
        if self.apply(TransportEvent::Stop) {
            engine.stop();
            self.elapsed = Duration::ZERO;
        }
    }

    /// Timer hook: refresh elapsed time and detect the end of the episode.
    ///
    /// Returns true when the session changed state.
    pub fn tick(&mut self, engine: &mut PlaybackEngine) -> bool {
        if self.state != TransportState::Playing {
            return false;
        }

        // The engine clock never runs backwards, but a reload resets it
        self.elapsed = self.elapsed.max(engine.elapsed());

        let reached_end = self
            .episode
            .duration
            .as_duration()
            .is_some_and(|total| self.elapsed >= total);

        if reached_end || engine.is_drained() {
            tracing::info!(session = %self.id, "episode finished");
            engine.stop();
            self.apply(TransportEvent::Finished);
            return true;
        }
        false
    }

    /// Tear the session down: stop audio and delete the downloaded file
    pub fn teardown(mut self, engine: &mut PlaybackEngine) {
        if matches!(
            self.state,
            TransportState::Ready | TransportState::Playing | TransportState::Paused
        ) {
            engine.stop();
        }
        if let Some(path) = self.local.take() {
            discard(path);
        }
        tracing::debug!(session = %self.id, "playback session closed");
    }
}
