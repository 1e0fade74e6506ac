use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::config::AudioSettings;
use crate::error::EngineError;

use super::thread::spawn_engine_thread;
use super::types::{
    ClockHandle, EngineClock, EngineCmd, EngineEvent, LoadId, MediaEngine,
};

/// `MediaEngine` backed by a dedicated rodio audio thread.
///
/// Dropping the engine stops the thread (with the configured fade-out) and
/// waits for it to exit.
pub struct RodioEngine {
    tx: Sender<EngineCmd>,
    clock: ClockHandle,
    fade_out_ms: u64,
    join: Option<JoinHandle<()>>,
}

impl RodioEngine {
    /// Open the default output device and start the audio thread.
    /// `listener` is called on the audio thread for every [`EngineEvent`].
    pub fn new(
        settings: &AudioSettings,
        listener: impl Fn(EngineEvent) + Send + 'static,
    ) -> Result<Self, EngineError> {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let (started_tx, started_rx) = mpsc::channel();
        let clock: ClockHandle = Arc::new(Mutex::new(EngineClock::default()));

        let join = spawn_engine_thread(rx, clock.clone(), Box::new(listener), started_tx);

        match started_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = join.join();
                return Err(e);
            }
            Err(_) => {
                let _ = join.join();
                return Err(EngineError::Disconnected);
            }
        }

        Ok(Self {
            tx,
            clock,
            fade_out_ms: settings.quit_fade_out_ms,
            join: Some(join),
        })
    }

    fn send(&self, cmd: EngineCmd) -> Result<(), EngineError> {
        self.tx.send(cmd).map_err(|_| EngineError::Disconnected)
    }
}

impl MediaEngine for RodioEngine {
    fn load(&mut self, load: LoadId, source: &Path) -> Result<(), EngineError> {
        self.send(EngineCmd::Load {
            load,
            path: source.to_path_buf(),
        })
    }

    fn play(&mut self) -> Result<(), EngineError> {
        self.send(EngineCmd::Play)
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        self.send(EngineCmd::Pause)
    }

    fn seek_to(&mut self, position_ms: u64) -> Result<(), EngineError> {
        self.send(EngineCmd::SeekTo(position_ms))
    }

    fn set_loop_mode(&mut self, looping: bool) -> Result<(), EngineError> {
        self.send(EngineCmd::SetLoopMode(looping))
    }

    fn current_position_ms(&self) -> u64 {
        self.clock
            .lock()
            .map(|c| c.position().as_millis() as u64)
            .unwrap_or(0)
    }

    fn is_playing(&self) -> bool {
        self.clock.lock().map(|c| c.is_running()).unwrap_or(false)
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        let Some(join) = self.join.take() else {
            return;
        };
        let _ = self.send(EngineCmd::Shutdown {
            fade_out_ms: self.fade_out_ms,
        });
        if join.join().is_err() {
            warn!("audio thread panicked");
        }
        debug!("media engine released");
    }
}
