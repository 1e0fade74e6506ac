//! Media engine: the `MediaEngine` seam the playback controller drives and
//! its rodio-backed implementation.

mod player;
mod sink;
mod thread;
mod types;

pub use player::RodioEngine;
pub use types::{EngineEvent, EventListener, LoadId, MediaEngine};

#[cfg(test)]
pub(crate) mod fake;
