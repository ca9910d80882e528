//! Playback infrastructure
//!
//! - Fetch: downloads episode audio to temporary local storage
//! - Engine: audio output control over rodio
//! - Session: per-episode transport state machine

pub mod engine;
pub mod fetch;
pub mod session;

pub use engine::{AudioOutput, AudioStream, PlaybackEngine, PlaybackError, RodioOutput};
pub use fetch::{FetchError, FetchWorker};
pub use session::{FetchOrder, PlaybackSession, SessionError};
