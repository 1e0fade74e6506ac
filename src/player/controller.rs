use tracing::{debug, warn};

use crate::engine::{EngineEvent, LoadId, MediaEngine};
use crate::error::{PlayerError, Result};
use crate::library::Track;

use super::order::PlayOrder;
use super::progress::{clamp_fraction, progress_fraction};
use super::ticker::Ticker;

/// Owns one playback session: which track is active, in which order, and
/// the transport state. Audio work is delegated to the engine `E`.
///
/// Every mutation goes through these methods on the UI thread; engine
/// notifications and ticks must be marshalled there and fed in through
/// [`on_engine_event`](Self::on_engine_event) and [`on_tick`](Self::on_tick).
pub struct PlaybackController<E: MediaEngine> {
    engine: E,
    playlist: Vec<Track>,
    order: PlayOrder,
    position: usize,
    playing: bool,
    repeat: bool,
    elapsed_ms: u64,
    duration_ms: u64,
    last_error: Option<String>,
    /// Id of the latest `load`; item events tagged otherwise are stale.
    load: LoadId,
    ticker: Ticker,
}

/// Read-only view of a session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot<'a> {
    pub track: &'a Track,
    pub position: usize,
    pub len: usize,
    pub playing: bool,
    pub shuffle: bool,
    pub repeat: bool,
    pub elapsed_ms: u64,
    pub duration_ms: u64,
    pub progress: f64,
    pub last_error: Option<&'a str>,
}

impl<E: MediaEngine> PlaybackController<E> {
    /// Start a session at `initial_index` in playlist order and begin playback.
    pub fn start(
        engine: E,
        playlist: Vec<Track>,
        initial_index: usize,
        ticker: Ticker,
    ) -> Result<Self> {
        if playlist.is_empty() {
            return Err(PlayerError::EmptyPlaylist);
        }
        if initial_index >= playlist.len() {
            return Err(PlayerError::InvalidIndex {
                index: initial_index,
                len: playlist.len(),
            });
        }

        let order = PlayOrder::identity(playlist.len());
        let mut controller = Self {
            engine,
            playlist,
            order,
            position: initial_index,
            playing: false,
            repeat: false,
            elapsed_ms: 0,
            duration_ms: 0,
            last_error: None,
            load: 0,
            ticker,
        };
        controller.engine.set_loop_mode(false)?;
        controller.play_current()?;
        Ok(controller)
    }

    pub fn current_track(&self) -> &Track {
        &self.playlist[self.current_index()]
    }

    /// Playlist index of the current track.
    pub fn current_index(&self) -> usize {
        self.order.track_index(self.position)
    }

    /// Playlist indices in the order they are played.
    #[cfg(test)]
    pub fn active_order(&self) -> Vec<usize> {
        self.order.indices()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_shuffle_enabled(&self) -> bool {
        self.order.is_shuffled()
    }

    pub fn is_repeat_enabled(&self) -> bool {
        self.repeat
    }

    #[cfg(test)]
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn progress(&self) -> f64 {
        progress_fraction(self.elapsed_ms, self.duration_ms)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot<'_> {
        PlaybackSnapshot {
            track: self.current_track(),
            position: self.position,
            len: self.order.len(),
            playing: self.playing,
            shuffle: self.is_shuffle_enabled(),
            repeat: self.repeat,
            elapsed_ms: self.elapsed_ms(),
            duration_ms: self.duration_ms(),
            progress: self.progress(),
            last_error: self.last_error(),
        }
    }

    /// Load the track at the current position and start it.
    fn play_current(&mut self) -> Result<()> {
        let track = self.current_track();
        debug!(position = self.position, id = %track.id, "loading track");
        let source = track.source.clone();

        self.elapsed_ms = 0;
        self.duration_ms = 0;
        self.last_error = None;
        self.load += 1;
        self.engine.load(self.load, &source)?;
        self.engine.play()?;
        Ok(())
    }

    /// Switch between a fresh random order and playlist order.
    ///
    /// The position is kept as a number, so after the switch it usually
    /// names a different track than the one still playing. The audible
    /// track only changes on the next skip or track end.
    pub fn toggle_shuffle(&mut self) {
        let len = self.playlist.len();
        self.order = if self.order.is_shuffled() {
            PlayOrder::identity(len)
        } else {
            PlayOrder::shuffled(len)
        };
        debug!(
            shuffle = self.order.is_shuffled(),
            position = self.position,
            "shuffle toggled"
        );
    }

    pub fn toggle_repeat(&mut self) -> Result<()> {
        let repeat = !self.repeat;
        self.engine.set_loop_mode(repeat)?;
        self.repeat = repeat;
        debug!(repeat, "repeat toggled");
        Ok(())
    }

    pub fn next(&mut self) -> Result<()> {
        self.position = self.order.next_position(self.position);
        self.play_current()
    }

    pub fn previous(&mut self) -> Result<()> {
        self.position = self.order.previous_position(self.position);
        self.play_current()
    }

    /// Pause if the engine reports playing, else play.
    ///
    /// The engine's state lags the commands queued to it, so two toggles in
    /// quick succession can both send the same command.
    pub fn toggle_play_pause(&mut self) -> Result<()> {
        if self.engine.is_playing() {
            self.engine.pause()?;
        } else {
            self.engine.play()?;
        }
        Ok(())
    }

    /// Seek to `fraction` of the track, clamped to `[0, 1]`. The elapsed time
    /// is updated right away, before the engine confirms.
    pub fn seek(&mut self, fraction: f64) -> Result<()> {
        let fraction = clamp_fraction(fraction);
        let target_ms = (fraction * self.duration_ms as f64).round() as u64;
        self.engine.seek_to(target_ms)?;
        self.elapsed_ms = target_ms;
        Ok(())
    }

    /// Apply an engine notification. Item events from a load other than the
    /// latest one are dropped.
    pub fn on_engine_event(&mut self, event: EngineEvent) -> Result<()> {
        if event.load().is_some_and(|load| load != self.load) {
            debug!(?event, current = self.load, "ignoring event from an earlier load");
            return Ok(());
        }
        match event {
            EngineEvent::Ready { duration_ms, .. } => {
                self.duration_ms = duration_ms;
            }
            EngineEvent::Ended { .. } if self.repeat => {
                // The engine normally loops on its own; make sure it does.
                debug!(position = self.position, "track ended with repeat on");
                self.engine.set_loop_mode(true)?;
                self.engine.seek_to(0)?;
                self.engine.play()?;
                self.elapsed_ms = 0;
            }
            EngineEvent::Ended { .. } => {
                debug!(position = self.position, "track ended, advancing");
                self.next()?;
            }
            EngineEvent::PlayingChanged(playing) => {
                self.playing = playing;
                if playing {
                    self.ticker.start();
                } else {
                    self.ticker.stop();
                }
            }
            EngineEvent::Error { message, .. } => {
                warn!(position = self.position, error = %message, "playback error");
                self.last_error = Some(message);
            }
        }
        Ok(())
    }

    /// Sample the engine position. Ticks that arrive after playback stopped
    /// are ignored.
    pub fn on_tick(&mut self) {
        if !self.playing {
            return;
        }
        self.elapsed_ms = self.engine.current_position_ms();
    }
}

impl<E: MediaEngine> Drop for PlaybackController<E> {
    fn drop(&mut self) {
        // The tick loop must be gone before the engine is released.
        self.ticker.stop();
        debug!("playback session closed");
    }
}
