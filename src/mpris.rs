//! MPRIS remote control on the session bus.
//!
//! The D-Bus service runs on its own thread. Method calls and property
//! writes are turned into [`ControlCmd`]s for the UI loop; the UI loop
//! pushes state back through [`MprisHandle`].

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use zbus::object_server::SignalEmitter;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedValue, Value};

use crate::library::Track;

const BUS_NAME: &str = "org.mpris.MediaPlayer2.spindle";
const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const NOTIFY_POLL: Duration = Duration::from_millis(100);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    SetShuffle(bool),
    SetRepeat(bool),
}

/// `PlaybackStatus` as MPRIS reports it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }
}

#[derive(Debug, Default)]
struct SharedState {
    playback: PlaybackStatus,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<ObjectPath<'static>>,
    shuffle: bool,
    repeat: bool,
}

/// UI-side handle for publishing player state to MPRIS clients.
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    pub fn set_playback(&self, playback: PlaybackStatus) {
        if let Ok(mut s) = self.state.lock() {
            s.playback = playback;
        }
        let _ = self.notify.send(());
    }

    /// Publish the now-playing track, or clear it with `None`.
    /// `index` is the track's position in the library.
    pub fn set_track_metadata(&self, index: Option<usize>, track: Option<&Track>) {
        if let Ok(mut s) = self.state.lock() {
            match track {
                Some(track) => {
                    s.title = Some(track.title.clone());
                    s.artist = vec![track.artist.clone()];
                    s.album = track.album.clone();
                    s.url = Some(format!("file://{}", track.source.display()));
                    s.length_micros = track
                        .duration
                        .map(|d| d.as_micros().min(i64::MAX as u128) as i64);
                    s.track_id = index.and_then(|i| {
                        ObjectPath::try_from(format!("{OBJECT_PATH}/track/{i}")).ok()
                    });
                }
                None => {
                    s.title = None;
                    s.artist.clear();
                    s.album = None;
                    s.url = None;
                    s.length_micros = None;
                    s.track_id = None;
                }
            }
        }
        let _ = self.notify.send(());
    }

    pub fn set_modes(&self, shuffle: bool, repeat: bool) {
        if let Ok(mut s) = self.state.lock() {
            s.shuffle = shuffle;
            s.repeat = repeat;
        }
        let _ = self.notify.send(());
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {}

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "spindle"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        self.state
            .lock()
            .map(|s| s.playback.as_str())
            .unwrap_or("Stopped")
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.state.lock().map(|s| s.shuffle).unwrap_or(false)
    }

    #[zbus(property)]
    fn set_shuffle(&mut self, value: bool) {
        let _ = self.tx.send(ControlCmd::SetShuffle(value));
    }

    /// `Track` while repeat is on. Otherwise `Playlist`, since skipping
    /// past the last track wraps around to the first.
    #[zbus(property)]
    fn loop_status(&self) -> &str {
        let repeat = self.state.lock().map(|s| s.repeat).unwrap_or(false);
        if repeat { "Track" } else { "Playlist" }
    }

    #[zbus(property)]
    fn set_loop_status(&mut self, value: String) {
        match value.as_str() {
            "Track" => {
                let _ = self.tx.send(ControlCmd::SetRepeat(true));
            }
            "Playlist" | "None" => {
                let _ = self.tx.send(ControlCmd::SetRepeat(false));
            }
            other => warn!(value = other, "unknown LoopStatus requested"),
        }
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let mut put = |key: &str, value: Value<'_>| {
            if let Ok(v) = OwnedValue::try_from(value) {
                map.insert(key.to_string(), v);
            }
        };

        if let Some(id) = &s.track_id {
            put("mpris:trackid", Value::from(id.clone()));
        }
        if let Some(title) = &s.title {
            put("xesam:title", Value::from(title.clone()));
        }
        if !s.artist.is_empty() {
            put("xesam:artist", Value::from(s.artist.clone()));
        }
        if let Some(album) = &s.album {
            put("xesam:album", Value::from(album.clone()));
        }
        if let Some(url) = &s.url {
            put("xesam:url", Value::from(url.clone()));
        }
        if let Some(len) = s.length_micros {
            put("mpris:length", Value::from(len));
        }
        map
    }
}

/// Start the MPRIS service thread. Failing to reach the session bus only
/// logs a warning; the handle keeps working without clients.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    let spawned = std::thread::Builder::new()
        .name("mpris".to_string())
        .spawn(move || {
            block_on(async move {
                if let Err(e) = serve(tx, state_for_thread, notify_rx).await {
                    warn!(error = %e, "MPRIS service unavailable");
                }
            });
        });
    if let Err(e) = spawned {
        warn!(error = %e, "failed to spawn MPRIS thread");
    }

    MprisHandle {
        state,
        notify: notify_tx,
    }
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify_rx: Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    info!(name = BUS_NAME, "MPRIS service registered");

    let iface_ref = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;

    loop {
        Timer::after(NOTIFY_POLL).await;

        let mut changed = false;
        loop {
            match notify_rx.try_recv() {
                Ok(()) => changed = true,
                Err(mpsc::TryRecvError::Empty) => break,
                // The UI side is gone; stop serving.
                Err(mpsc::TryRecvError::Disconnected) => return Ok(()),
            }
        }
        if !changed {
            continue;
        }

        let iface = iface_ref.get().await;
        if let Err(e) = emit_changes(&iface, iface_ref.signal_emitter()).await {
            debug!(error = %e, "failed to emit MPRIS property changes");
        }
    }
}

async fn emit_changes(iface: &PlayerIface, emitter: &SignalEmitter<'_>) -> zbus::Result<()> {
    iface.playback_status_changed(emitter).await?;
    iface.metadata_changed(emitter).await?;
    iface.shuffle_changed(emitter).await?;
    iface.loop_status_changed(emitter).await?;
    Ok(())
}
