//! Recording `MediaEngine` used by the controller and app tests.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::EngineError;

use super::types::{EngineEvent, LoadId, MediaEngine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Load(PathBuf),
    Play,
    Pause,
    SeekTo(u64),
    SetLoopMode(bool),
}

#[derive(Debug, Default)]
pub(crate) struct Probe {
    pub calls: Vec<Call>,
    pub playing: bool,
    pub looping: bool,
    pub position_ms: u64,
    /// Id passed to the latest `load`.
    pub load: LoadId,
    pub released: usize,
    /// When set, every command fails with `Disconnected`.
    pub broken: bool,
}

pub(crate) type ProbeHandle = Rc<RefCell<Probe>>;

pub(crate) struct FakeEngine {
    probe: ProbeHandle,
}

impl FakeEngine {
    pub(crate) fn new() -> (Self, ProbeHandle) {
        let probe = ProbeHandle::default();
        (
            Self {
                probe: probe.clone(),
            },
            probe,
        )
    }

    fn record(&mut self, call: Call) -> Result<(), EngineError> {
        let mut probe = self.probe.borrow_mut();
        if probe.broken {
            return Err(EngineError::Disconnected);
        }
        match &call {
            Call::Play => probe.playing = true,
            Call::Pause => probe.playing = false,
            Call::SeekTo(ms) => probe.position_ms = *ms,
            Call::SetLoopMode(looping) => probe.looping = *looping,
            Call::Load(_) => {
                probe.playing = false;
                probe.position_ms = 0;
            }
        }
        probe.calls.push(call);
        Ok(())
    }
}

impl MediaEngine for FakeEngine {
    fn load(&mut self, load: LoadId, source: &Path) -> Result<(), EngineError> {
        self.record(Call::Load(source.to_path_buf()))?;
        self.probe.borrow_mut().load = load;
        Ok(())
    }

    fn play(&mut self) -> Result<(), EngineError> {
        self.record(Call::Play)
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        self.record(Call::Pause)
    }

    fn seek_to(&mut self, position_ms: u64) -> Result<(), EngineError> {
        self.record(Call::SeekTo(position_ms))
    }

    fn set_loop_mode(&mut self, looping: bool) -> Result<(), EngineError> {
        self.record(Call::SetLoopMode(looping))
    }

    fn current_position_ms(&self) -> u64 {
        self.probe.borrow().position_ms
    }

    fn is_playing(&self) -> bool {
        self.probe.borrow().playing
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.probe.borrow_mut().released += 1;
    }
}

/// Paths passed to `load`, in order.
pub(crate) fn loads(probe: &ProbeHandle) -> Vec<PathBuf> {
    probe
        .borrow()
        .calls
        .iter()
        .filter_map(|c| match c {
            Call::Load(p) => Some(p.clone()),
            _ => None,
        })
        .collect()
}

/// `Ready` for the item the engine loaded last.
pub(crate) fn ready(probe: &ProbeHandle, duration_ms: u64) -> EngineEvent {
    EngineEvent::Ready {
        load: probe.borrow().load,
        duration_ms,
    }
}

/// `Ended` for the item the engine loaded last.
pub(crate) fn ended(probe: &ProbeHandle) -> EngineEvent {
    EngineEvent::Ended {
        load: probe.borrow().load,
    }
}

/// `Error` for the item the engine loaded last.
pub(crate) fn failed(probe: &ProbeHandle, message: &str) -> EngineEvent {
    EngineEvent::Error {
        load: probe.borrow().load,
        message: message.to_string(),
    }
}
