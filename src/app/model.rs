//! Application model types: `App`, `Screen`, `Session` and `SessionEvent`.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::engine::{EngineEvent, MediaEngine};
use crate::error::Result;
use crate::library::Track;
use crate::player::PlaybackController;

/// Which screen is in front.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Shown at startup until `until`, or until any key is pressed.
    Splash { until: Instant },
    Library,
    Player,
}

/// Messages posted to the UI loop by a session's engine and ticker.
///
/// Each message carries the id of the session it belongs to, so messages
/// still in flight after a session closed are dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Engine { session: u64, event: EngineEvent },
    Tick { session: u64 },
}

impl SessionEvent {
    pub fn session(&self) -> u64 {
        match self {
            SessionEvent::Engine { session, .. } | SessionEvent::Tick { session } => *session,
        }
    }
}

/// A playback session: lives while the player screen is open.
pub struct Session<E: MediaEngine> {
    pub id: u64,
    pub controller: PlaybackController<E>,
    /// Bar heights for the player's waveform, fixed for the session.
    pub waveform: Vec<f32>,
}

/// The main application model.
pub struct App<E: MediaEngine> {
    pub tracks: Vec<Track>,
    pub selected: usize,
    pub screen: Screen,
    pub current_dir: Option<String>,
    /// One-line message shown in the footer (errors, empty library).
    pub notice: Option<String>,
    session: Option<Session<E>>,
    next_session_id: u64,
}

impl<E: MediaEngine> App<E> {
    /// Create a new `App` for `tracks`. The splash screen is shown for
    /// `splash`, or skipped when it is zero.
    pub fn new(tracks: Vec<Track>, splash: Duration) -> Self {
        let screen = if splash.is_zero() {
            Screen::Library
        } else {
            Screen::Splash {
                until: Instant::now() + splash,
            }
        };
        let notice = if tracks.is_empty() {
            Some("No audio files found".to_string())
        } else {
            None
        };

        Self {
            tracks,
            selected: 0,
            screen,
            current_dir: None,
            notice,
            session: None,
            next_session_id: 1,
        }
    }

    /// Record the scanned directory in the app state.
    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = Some(dir);
    }

    /// Return true if the library contains any tracks.
    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    /// Leave the splash screen once its time is up.
    pub fn tick_splash(&mut self, now: Instant) {
        if let Screen::Splash { until } = self.screen {
            if now >= until {
                self.screen = Screen::Library;
            }
        }
    }

    pub fn skip_splash(&mut self) {
        if matches!(self.screen, Screen::Splash { .. }) {
            self.screen = Screen::Library;
        }
    }

    /// Move selection to the next track, wrapping to the first.
    pub fn next(&mut self) {
        if self.has_tracks() {
            self.selected = (self.selected + 1) % self.tracks.len();
        }
    }

    /// Move selection to the previous track, wrapping to the last.
    pub fn prev(&mut self) {
        if self.has_tracks() {
            self.selected = (self.selected + self.tracks.len() - 1) % self.tracks.len();
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.tracks.len().saturating_sub(1);
    }

    /// Reserve the id for the next session. Ids are never reused.
    pub fn allocate_session_id(&mut self) -> u64 {
        let id = self.next_session_id;
        self.next_session_id += 1;
        id
    }

    pub fn session(&self) -> Option<&Session<E>> {
        self.session.as_ref()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Install a freshly started session and bring up the player screen.
    /// Any previous session is released first.
    pub fn open_session(&mut self, session: Session<E>) {
        self.close_session();
        debug!(session = session.id, "player opened");
        self.session = Some(session);
        self.notice = None;
        self.screen = Screen::Player;
    }

    /// Tear down the session (engine released, tick loop stopped) and go
    /// back to the list.
    pub fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(session = session.id, "player closed");
        }
        if self.screen == Screen::Player {
            self.screen = Screen::Library;
        }
    }

    /// Run a controller command. A failure is shown as a notice and logged;
    /// the session stays open.
    pub fn control(&mut self, op: impl FnOnce(&mut PlaybackController<E>) -> Result<()>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Err(e) = op(&mut session.controller) {
            warn!(session = session.id, error = %e, "playback command failed");
            self.notice = Some(e.to_string());
        }
    }

    /// Seek relative to the current progress by `percent` of the duration.
    pub fn scrub(&mut self, percent: i16) {
        self.control(|c| {
            let target = c.progress() + f64::from(percent) / 100.0;
            c.seek(target)
        });
    }

    /// Seek to `digit` tenths of the track (`0` = start, `9` = 90 %).
    pub fn seek_to_tenth(&mut self, digit: u8) {
        let fraction = f64::from(digit.min(9)) / 10.0;
        self.control(|c| c.seek(fraction));
    }

    /// Feed a message from the engine or ticker into the session it belongs
    /// to. Returns false when the message was stale and ignored.
    pub fn handle_session_event(&mut self, event: SessionEvent) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.id != event.session() {
            return false;
        }
        match event {
            SessionEvent::Tick { .. } => session.controller.on_tick(),
            SessionEvent::Engine { event, .. } => {
                if let Err(e) = session.controller.on_engine_event(event) {
                    warn!(session = session.id, error = %e, "engine event handling failed");
                    self.notice = Some(e.to_string());
                }
            }
        }
        true
    }
}
