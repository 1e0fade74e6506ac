//! Application module: the app model shared by the TUI and the runtime.
//!
//! `App` holds the scanned library, the list selection, the active screen
//! and the playback session (if any).

mod model;

pub use model::*;
