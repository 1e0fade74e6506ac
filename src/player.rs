//! Playback core: the session controller that owns the playlist order and
//! transport state, and drives a [`MediaEngine`](crate::engine::MediaEngine).

mod controller;
mod order;
mod progress;
mod ticker;

pub use controller::PlaybackController;
pub use progress::format_mmss;
pub use ticker::Ticker;

#[cfg(test)]
mod tests;
