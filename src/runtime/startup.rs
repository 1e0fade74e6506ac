use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::{info, warn};

use crate::app::{App, Session, SessionEvent};
use crate::config::{RepeatSetting, Settings};
use crate::engine::{EventListener, MediaEngine};
use crate::error::EngineError;
use crate::player::{PlaybackController, Ticker};
use crate::waveform;

/// Open a playback session at the selected track and show the player.
///
/// `open_engine` receives the listener that routes engine notifications,
/// tagged with the new session id, onto `session_tx`. Failures leave the app
/// on the list with a notice.
pub fn start_session<E: MediaEngine>(
    app: &mut App<E>,
    settings: &Settings,
    session_tx: &Sender<SessionEvent>,
    open_engine: &dyn Fn(EventListener) -> Result<E, EngineError>,
) {
    if !app.has_tracks() {
        app.notice = Some("No audio files to play".to_string());
        return;
    }

    // The old engine must let go of the output device first.
    app.close_session();
    let id = app.allocate_session_id();

    let engine_tx = session_tx.clone();
    let listener: EventListener = Box::new(move |event| {
        let _ = engine_tx.send(SessionEvent::Engine { session: id, event });
    });
    let engine = match open_engine(listener) {
        Ok(engine) => engine,
        Err(e) => {
            warn!(session = id, error = %e, "failed to open media engine");
            app.notice = Some(e.to_string());
            return;
        }
    };

    let tick_tx = session_tx.clone();
    let ticker = Ticker::new(Duration::from_millis(settings.playback.tick_ms), move || {
        let _ = tick_tx.send(SessionEvent::Tick { session: id });
    });

    let mut controller =
        match PlaybackController::start(engine, app.tracks.clone(), app.selected, ticker) {
            Ok(c) => c,
            Err(e) => {
                warn!(session = id, error = %e, "failed to start playback");
                app.notice = Some(e.to_string());
                return;
            }
        };

    if settings.playback.repeat == RepeatSetting::One {
        if let Err(e) = controller.toggle_repeat() {
            warn!(session = id, error = %e, "failed to apply repeat default");
        }
    }

    info!(session = id, track = %controller.current_track().id, "playback session started");
    app.open_session(Session {
        id,
        controller,
        waveform: waveform::generate(settings.ui.waveform_bars),
    });
}
