use crate::app::App;
use crate::engine::MediaEngine;
use crate::mpris::{MprisHandle, PlaybackStatus};

/// The part of the app state MPRIS clients see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MprisView {
    pub track_index: Option<usize>,
    pub status: PlaybackStatus,
    pub shuffle: bool,
    pub repeat: bool,
}

impl MprisView {
    pub fn of<E: MediaEngine>(app: &App<E>) -> Self {
        let Some(session) = app.session() else {
            return Self::default();
        };
        let c = &session.controller;
        Self {
            track_index: Some(c.current_index()),
            status: if c.is_playing() {
                PlaybackStatus::Playing
            } else {
                PlaybackStatus::Paused
            },
            shuffle: c.is_shuffle_enabled(),
            repeat: c.is_repeat_enabled(),
        }
    }
}

/// Push the app state to MPRIS when it differs from what was last sent.
pub fn update_mpris<E: MediaEngine>(mpris: &MprisHandle, app: &App<E>, last: &mut MprisView) {
    let view = MprisView::of(app);
    if view == *last {
        return;
    }

    if view.track_index != last.track_index {
        let track = view.track_index.and_then(|i| app.tracks.get(i));
        mpris.set_track_metadata(view.track_index, track);
    }
    if view.status != last.status {
        mpris.set_playback(view.status);
    }
    if view.shuffle != last.shuffle || view.repeat != last.repeat {
        mpris.set_modes(view.shuffle, view.repeat);
    }
    *last = view;
}
