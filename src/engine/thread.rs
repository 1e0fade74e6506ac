use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, warn};

use crate::error::EngineError;

use super::sink::create_sink_at;
use super::types::{ClockHandle, EngineClock, EngineCmd, EngineEvent, EventListener, LoadId};

/// How long the thread waits for a command before checking for end of track.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Spawn the audio thread. It reports on `started` whether an output device
/// could be opened before it accepts any command.
pub(super) fn spawn_engine_thread(
    rx: Receiver<EngineCmd>,
    clock: ClockHandle,
    listener: EventListener,
    started: Sender<Result<(), EngineError>>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "failed to open audio output");
                let _ = started.send(Err(EngineError::NoOutputDevice));
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped, which would
        // scribble over the TUI.
        stream.log_on_drop(false);
        let _ = started.send(Ok(()));

        let mut audio = AudioThread {
            stream,
            sink: None,
            load: 0,
            current: None,
            playing: false,
            looping: false,
            clock,
            listener,
        };

        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(EngineCmd::Shutdown { fade_out_ms }) => {
                    audio.shutdown(fade_out_ms);
                    break;
                }
                Ok(cmd) => audio.handle(cmd),
                Err(RecvTimeoutError::Timeout) => audio.check_end(),
                Err(RecvTimeoutError::Disconnected) => {
                    audio.shutdown(0);
                    break;
                }
            }
        }
        debug!("audio thread stopped");
    })
}

struct AudioThread {
    stream: OutputStream,
    sink: Option<Sink>,
    /// Id of the latest `Load`; item events are tagged with it.
    load: LoadId,
    current: Option<PathBuf>,
    playing: bool,
    looping: bool,
    clock: ClockHandle,
    listener: EventListener,
}

impl AudioThread {
    fn handle(&mut self, cmd: EngineCmd) {
        match cmd {
            EngineCmd::Load { load, path } => self.load(load, path),
            EngineCmd::Play => self.play(),
            EngineCmd::Pause => {
                if let Some(sink) = &self.sink {
                    sink.pause();
                    self.set_playing(false);
                }
            }
            EngineCmd::SeekTo(ms) => {
                // Scrubbing: rebuild the current sink and skip into the file.
                self.rebuild(Duration::from_millis(ms));
            }
            EngineCmd::SetLoopMode(looping) => self.looping = looping,
            EngineCmd::Shutdown { fade_out_ms } => self.shutdown(fade_out_ms),
        }
    }

    fn emit(&self, event: EngineEvent) {
        (self.listener)(event);
    }

    fn with_clock(&self, f: impl FnOnce(&mut EngineClock)) {
        if let Ok(mut clock) = self.clock.lock() {
            f(&mut clock);
        }
    }

    fn set_playing(&mut self, playing: bool) {
        if self.playing == playing {
            return;
        }
        self.playing = playing;
        self.with_clock(|c| if playing { c.resume() } else { c.pause() });
        self.emit(EngineEvent::PlayingChanged(playing));
    }

    fn load(&mut self, load: LoadId, path: PathBuf) {
        self.load = load;
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.set_playing(false);
        self.with_clock(|c| c.reset(Duration::ZERO));

        match create_sink_at(&self.stream, &path, Duration::ZERO) {
            Ok((sink, total)) => {
                let duration_ms = total.map_or(0, |d| d.as_millis() as u64);
                debug!(path = %path.display(), duration_ms, "item loaded");
                self.sink = Some(sink);
                self.current = Some(path);
                self.emit(EngineEvent::Ready {
                    load: self.load,
                    duration_ms,
                });
            }
            Err(e) => {
                warn!(error = %e, "failed to load item");
                self.current = None;
                self.emit(EngineEvent::Error {
                    load: self.load,
                    message: e.to_string(),
                });
            }
        }
    }

    fn play(&mut self) {
        // An exhausted sink starts over from the top.
        let exhausted = self.sink.as_ref().is_some_and(Sink::empty);
        if exhausted && !self.rebuild(Duration::ZERO) {
            return;
        }
        if let Some(sink) = &self.sink {
            sink.play();
            self.set_playing(true);
        }
    }

    /// Replace the sink with a fresh one for the current item positioned at
    /// `at`, keeping the play/pause state.
    fn rebuild(&mut self, at: Duration) -> bool {
        let Some(path) = self.current.clone() else {
            return false;
        };
        if let Some(old) = self.sink.take() {
            old.stop();
        }

        match create_sink_at(&self.stream, &path, at) {
            Ok((sink, _)) => {
                if self.playing {
                    sink.play();
                }
                self.sink = Some(sink);
                self.with_clock(|c| c.reset(at));
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to reopen item");
                self.set_playing(false);
                self.emit(EngineEvent::Error {
                    load: self.load,
                    message: e.to_string(),
                });
                false
            }
        }
    }

    fn check_end(&mut self) {
        let finished = self.playing && self.sink.as_ref().is_some_and(Sink::empty);
        if !finished {
            return;
        }
        if self.looping {
            debug!("item finished, looping");
            self.rebuild(Duration::ZERO);
        } else {
            self.set_playing(false);
            self.emit(EngineEvent::Ended { load: self.load });
        }
    }

    fn shutdown(&mut self, fade_out_ms: u64) {
        if let Some(sink) = self.sink.take() {
            if self.playing {
                fade_out_sink(&sink, fade_out_ms);
            }
            sink.stop();
        }
        self.playing = false;
        self.with_clock(EngineClock::pause);
    }
}

fn fade_out_sink(sink: &Sink, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    sink.set_volume(1.0);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(1.0 - t);
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}
