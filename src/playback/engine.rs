//! Playback engine
//!
//! Wraps the audio output device. At most one resource is loaded at a time;
//! loading another implicitly stops the previous one. Stopping drops the
//! output stream, which releases the device.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors from the audio output
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("Could not decode audio: {0}")]
    Decode(String),
    #[error("Could not open audio file: {0}")]
    Open(#[from] std::io::Error),
    #[error("No audio loaded")]
    NotLoaded,
}

/// Opens local audio files on an output device
pub trait AudioOutput {
    /// Open `path` and return a paused stream bound to the device
    fn open(&mut self, path: &Path) -> Result<Box<dyn AudioStream>, PlaybackError>;
}

/// A loaded audio resource. Dropping it releases the device.
pub trait AudioStream {
    fn play(&mut self);
    fn pause(&mut self);
    /// True once every sample has been handed to the device
    fn is_drained(&self) -> bool;
}

// =============================================================================
// Rodio Output
// =============================================================================

/// Default output using the system's default audio device
#[derive(Debug, Default)]
pub struct RodioOutput;

struct RodioStream {
    // Must outlive the sink; dropping it closes the device
    _stream: rodio::OutputStream,
    sink: rodio::Sink,
}

impl AudioOutput for RodioOutput {
    fn open(&mut self, path: &Path) -> Result<Box<dyn AudioStream>, PlaybackError> {
        let file = File::open(path)?;
        let source = rodio::Decoder::new(BufReader::new(file))
            .map_err(|e| PlaybackError::Decode(e.to_string()))?;

        let (stream, handle) = rodio::OutputStream::try_default()
            .map_err(|e| PlaybackError::DeviceUnavailable(e.to_string()))?;
        let sink = rodio::Sink::try_new(&handle)
            .map_err(|e| PlaybackError::DeviceUnavailable(e.to_string()))?;

        sink.pause();
        sink.append(source);

        Ok(Box::new(RodioStream {
            _stream: stream,
            sink,
        }))
    }
}

impl AudioStream for RodioStream {
    fn play(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn is_drained(&self) -> bool {
        self.sink.empty()
    }
}

impl Drop for RodioStream {
    fn drop(&mut self) {
        self.sink.stop();
    }
}

// =============================================================================
// Playback Clock
// =============================================================================

/// Wall-clock elapsed time that excludes paused intervals
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    running_since: Option<Instant>,
    accumulated: Duration,
}

impl PlaybackClock {
    pub fn start(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        self.accumulated
            + self
                .running_since
                .map(|since| since.elapsed())
                .unwrap_or_default()
    }
}

// =============================================================================
// Engine
// =============================================================================

struct Loaded {
    stream: Box<dyn AudioStream>,
    clock: PlaybackClock,
}

/// Transport control over a single audio output
pub struct PlaybackEngine {
    output: Box<dyn AudioOutput>,
    loaded: Option<Loaded>,
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("loaded", &self.loaded.is_some())
            .field("playing", &self.is_playing())
            .finish()
    }
}

impl PlaybackEngine {
    pub fn new(output: Box<dyn AudioOutput>) -> Self {
        Self {
            output,
            loaded: None,
        }
    }

    /// Engine on the system's default device
    pub fn rodio() -> Self {
        Self::new(Box::new(RodioOutput))
    }

    /// Load a local file, replacing anything already loaded. Starts paused.
    pub fn load(&mut self, path: &Path) -> Result<(), PlaybackError> {
        self.stop();
        let stream = self.output.open(path)?;
        tracing::debug!(path = %path.display(), "audio loaded");
        self.loaded = Some(Loaded {
            stream,
            clock: PlaybackClock::default(),
        });
        Ok(())
    }

    /// Start output. No-op while already playing.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        let loaded = self.loaded.as_mut().ok_or(PlaybackError::NotLoaded)?;
        if !loaded.clock.is_running() {
            loaded.stream.play();
            loaded.clock.start();
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        let loaded = self.loaded.as_mut().ok_or(PlaybackError::NotLoaded)?;
        if loaded.clock.is_running() {
            loaded.stream.pause();
            loaded.clock.pause();
        }
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        self.play()
    }

    /// Stop output and release the device
    pub fn stop(&mut self) {
        if self.loaded.take().is_some() {
            tracing::debug!("audio output released");
        }
    }

    /// Elapsed playback time of the loaded resource (zero when none)
    pub fn elapsed(&self) -> Duration {
        self.loaded
            .as_ref()
            .map(|l| l.clock.elapsed())
            .unwrap_or_default()
    }

    pub fn is_playing(&self) -> bool {
        self.loaded
            .as_ref()
            .is_some_and(|l| l.clock.is_running())
    }

    /// Whether a resource currently holds the output device
    pub fn has_output(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn is_drained(&self) -> bool {
        self.loaded.as_ref().is_some_and(|l| l.stream.is_drained())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counters {
        opened: usize,
        open_now: usize,
        plays: usize,
    }

    struct FakeOutput(Rc<RefCell<Counters>>);
    struct FakeStream(Rc<RefCell<Counters>>);

    impl AudioOutput for FakeOutput {
        fn open(&mut self, _path: &Path) -> Result<Box<dyn AudioStream>, PlaybackError> {
            let mut c = self.0.borrow_mut();
            c.opened += 1;
            c.open_now += 1;
            Ok(Box::new(FakeStream(self.0.clone())))
        }
    }

    impl AudioStream for FakeStream {
        fn play(&mut self) {
            self.0.borrow_mut().plays += 1;
        }
        fn pause(&mut self) {}
        fn is_drained(&self) -> bool {
            false
        }
    }

    impl Drop for FakeStream {
        fn drop(&mut self) {
            self.0.borrow_mut().open_now -= 1;
        }
    }

    struct NoDevice;

    impl AudioOutput for NoDevice {
        fn open(&mut self, _path: &Path) -> Result<Box<dyn AudioStream>, PlaybackError> {
            Err(PlaybackError::DeviceUnavailable("no sound card".into()))
        }
    }

    fn engine() -> (PlaybackEngine, Rc<RefCell<Counters>>) {
        let counters = Rc::new(RefCell::new(Counters::default()));
        (
            PlaybackEngine::new(Box::new(FakeOutput(counters.clone()))),
            counters,
        )
    }

    #[test]
    fn test_play_requires_load() {
        let (mut engine, _) = engine();
        assert!(matches!(engine.play(), Err(PlaybackError::NotLoaded)));
        assert!(matches!(engine.pause(), Err(PlaybackError::NotLoaded)));
    }

    #[test]
    fn test_play_is_idempotent() {
        let (mut engine, counters) = engine();
        engine.load(Path::new("a.mp3")).unwrap();
        engine.play().unwrap();
        engine.play().unwrap();
        assert_eq!(counters.borrow().plays, 1);
        assert!(engine.is_playing());
    }

    #[test]
    fn test_load_replaces_previous() {
        let (mut engine, counters) = engine();
        engine.load(Path::new("a.mp3")).unwrap();
        engine.load(Path::new("b.mp3")).unwrap();
        assert_eq!(counters.borrow().opened, 2);
        assert_eq!(counters.borrow().open_now, 1);
    }

    #[test]
    fn test_stop_releases_device() {
        let (mut engine, counters) = engine();
        engine.load(Path::new("a.mp3")).unwrap();
        engine.play().unwrap();
        engine.stop();
        assert!(!engine.has_output());
        assert!(!engine.is_playing());
        assert_eq!(counters.borrow().open_now, 0);
        assert_eq!(engine.elapsed(), Duration::ZERO);
        // Stopping twice is harmless
        engine.stop();
    }

    #[test]
    fn test_device_unavailable_surfaces_error() {
        let mut engine = PlaybackEngine::new(Box::new(NoDevice));
        assert!(matches!(
            engine.load(Path::new("a.mp3")),
            Err(PlaybackError::DeviceUnavailable(_))
        ));
        assert!(!engine.has_output());
    }

    #[test]
    fn test_clock_excludes_paused_time() {
        let mut clock = PlaybackClock::default();
        assert_eq!(clock.elapsed(), Duration::ZERO);

        clock.start();
        std::thread::sleep(Duration::from_millis(20));
        clock.pause();
        let paused_at = clock.elapsed();
        assert!(paused_at >= Duration::from_millis(20));

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(clock.elapsed(), paused_at);

        clock.start();
        assert!(clock.elapsed() >= paused_at);
    }
}
