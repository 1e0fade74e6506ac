//! Error types for the playback core and the media engine.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by a [`MediaEngine`](crate::engine::MediaEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// No audio output device could be opened.
    #[error("no audio output device available")]
    NoOutputDevice,

    /// The audio file could not be opened.
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The audio file was opened but could not be decoded.
    #[error("failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },

    /// The engine thread has exited and no longer accepts commands.
    #[error("media engine is no longer running")]
    Disconnected,
}

/// Failures of the playback controller.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// A session was requested for a playlist without tracks.
    #[error("playlist is empty")]
    EmptyPlaylist,

    /// The requested start index does not exist in the playlist.
    #[error("track index {index} is out of range for a playlist of {len}")]
    InvalidIndex { index: usize, len: usize },

    /// The media engine refused a command.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Result type for controller operations.
pub type Result<T, E = PlayerError> = std::result::Result<T, E>;
