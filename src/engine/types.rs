//! Engine-facing types: the `MediaEngine` seam, its notifications, the
//! commands sent to the audio thread and the shared playback clock.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::EngineError;

/// Decodes and outputs audio for one playback session.
///
/// Commands return as soon as they are queued; their effects are reported
/// back through [`EngineEvent`]s.
pub trait MediaEngine {
    /// Replace the current item with the file at `source`. Does not start
    /// playback. Every later `Ready`, `Ended` and `Error` about this item
    /// carries `load`.
    fn load(&mut self, load: LoadId, source: &Path) -> Result<(), EngineError>;
    fn play(&mut self) -> Result<(), EngineError>;
    fn pause(&mut self) -> Result<(), EngineError>;
    fn seek_to(&mut self, position_ms: u64) -> Result<(), EngineError>;
    /// When on, the current item restarts instead of ending.
    fn set_loop_mode(&mut self, looping: bool) -> Result<(), EngineError>;
    fn current_position_ms(&self) -> u64;
    /// Whether audio is currently running. A `play` or `pause` still queued
    /// for the engine is not reflected yet.
    fn is_playing(&self) -> bool;
}

/// Tags one `load` request so its events can be told apart from those of
/// the items loaded before it.
pub type LoadId = u64;

/// Notifications posted by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The loaded item is decodable; its duration is known (0 when it is not).
    Ready { load: LoadId, duration_ms: u64 },
    /// The current item played to its end and loop mode is off.
    Ended { load: LoadId },
    PlayingChanged(bool),
    /// Load or playback failed. Non-fatal.
    Error { load: LoadId, message: String },
}

impl EngineEvent {
    /// The load an item event belongs to; `None` for transport changes.
    pub fn load(&self) -> Option<LoadId> {
        match self {
            Self::Ready { load, .. } | Self::Ended { load } | Self::Error { load, .. } => {
                Some(*load)
            }
            Self::PlayingChanged(_) => None,
        }
    }
}

/// Callback receiving engine notifications on the engine's own thread.
pub type EventListener = Box<dyn Fn(EngineEvent) + Send + 'static>;

#[derive(Debug)]
pub(crate) enum EngineCmd {
    Load { load: LoadId, path: PathBuf },
    Play,
    Pause,
    SeekTo(u64),
    SetLoopMode(bool),
    /// Stop the audio thread, fading out over `fade_out_ms` milliseconds.
    Shutdown { fade_out_ms: u64 },
}

/// Playback position of the current item: time accumulated while paused
/// plus the time since playback last resumed.
#[derive(Debug, Clone, Default)]
pub struct EngineClock {
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl EngineClock {
    pub fn position(&self) -> Duration {
        self.accumulated + self.running_since.map_or(Duration::ZERO, |st| st.elapsed())
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn resume(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        if let Some(st) = self.running_since.take() {
            self.accumulated += st.elapsed();
        }
    }

    /// Jump to `at`, keeping the running/paused state.
    pub fn reset(&mut self, at: Duration) {
        self.accumulated = at;
        if self.running_since.is_some() {
            self.running_since = Some(Instant::now());
        }
    }
}

pub type ClockHandle = Arc<Mutex<EngineClock>>;
