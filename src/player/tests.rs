use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use proptest::prelude::*;

use super::order::PlayOrder;
use super::progress::progress_fraction;
use super::*;
use crate::engine::EngineEvent;
use crate::engine::fake::{Call, FakeEngine, ProbeHandle, ended, failed, loads, ready};
use crate::error::PlayerError;
use crate::library::{ArtRef, Track};

fn track(i: usize) -> Track {
    Track {
        id: format!("{i}.mp3"),
        title: format!("Song {i}"),
        artist: "Artist".to_string(),
        album: None,
        album_art: ArtRef::None,
        source: PathBuf::from(format!("/music/{i}.mp3")),
        duration: None,
    }
}

fn playlist(len: usize) -> Vec<Track> {
    (0..len).map(track).collect()
}

fn idle_ticker() -> Ticker {
    Ticker::new(Duration::from_secs(3600), || {})
}

fn start(len: usize, index: usize) -> (PlaybackController<FakeEngine>, ProbeHandle) {
    let (engine, probe) = FakeEngine::new();
    let controller = PlaybackController::start(engine, playlist(len), index, idle_ticker())
        .expect("session starts");
    (controller, probe)
}

#[test]
fn start_loads_and_plays_the_selected_track() {
    let (c, probe) = start(3, 1);
    assert_eq!(c.position(), 1);
    assert_eq!(c.current_track().id, "1.mp3");
    assert_eq!(c.active_order(), vec![0, 1, 2]);
    assert!(!c.is_shuffle_enabled());
    assert!(!c.is_repeat_enabled());
    assert_eq!(
        probe.borrow().calls,
        vec![
            Call::SetLoopMode(false),
            Call::Load(PathBuf::from("/music/1.mp3")),
            Call::Play,
        ]
    );
}

#[test]
fn start_rejects_empty_playlist_without_touching_the_engine() {
    let (engine, probe) = FakeEngine::new();
    let err = PlaybackController::start(engine, Vec::new(), 0, idle_ticker())
        .err()
        .expect("empty playlist fails");
    assert!(matches!(err, PlayerError::EmptyPlaylist));
    assert!(probe.borrow().calls.is_empty());
    assert_eq!(probe.borrow().released, 1);
}

#[test]
fn start_rejects_out_of_range_index() {
    let (engine, probe) = FakeEngine::new();
    let err = PlaybackController::start(engine, playlist(3), 3, idle_ticker())
        .err()
        .expect("index 3 is out of range");
    assert!(matches!(err, PlayerError::InvalidIndex { index: 3, len: 3 }));
    assert!(probe.borrow().calls.is_empty());
}

#[test]
fn next_wraps_around_three_tracks() {
    let (mut c, probe) = start(3, 0);
    c.next().unwrap();
    assert_eq!(c.position(), 1);
    c.next().unwrap();
    c.next().unwrap();
    assert_eq!(c.position(), 0);
    assert_eq!(
        loads(&probe),
        vec![
            PathBuf::from("/music/0.mp3"),
            PathBuf::from("/music/1.mp3"),
            PathBuf::from("/music/2.mp3"),
            PathBuf::from("/music/0.mp3"),
        ]
    );
}

#[test]
fn previous_wraps_from_first_to_last() {
    let (mut c, _probe) = start(4, 0);
    c.previous().unwrap();
    assert_eq!(c.position(), 3);
    assert_eq!(c.current_track().id, "3.mp3");
}

#[test]
fn skipping_resets_elapsed_and_duration() {
    let (mut c, probe) = start(2, 0);
    c.on_engine_event(ready(&probe, 90_000))
        .unwrap();
    c.seek(0.5).unwrap();
    assert_eq!(c.elapsed_ms(), 45_000);

    c.next().unwrap();
    assert_eq!(c.elapsed_ms(), 0);
    assert_eq!(c.duration_ms(), 0);
}

#[test]
fn shuffle_on_builds_a_permutation_of_five() {
    let (mut c, _probe) = start(5, 0);
    c.toggle_shuffle();
    assert!(c.is_shuffle_enabled());

    let mut order = c.active_order();
    assert_eq!(order.len(), 5);
    order.sort_unstable();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
}

#[test]
fn shuffle_keeps_position_numerically_and_does_not_reload() {
    let (mut c, probe) = start(5, 2);
    let before = probe.borrow().calls.len();

    c.toggle_shuffle();
    assert_eq!(c.position(), 2);
    let expected = c.active_order()[2];
    assert_eq!(c.current_track().id, format!("{expected}.mp3"));
    assert_eq!(probe.borrow().calls.len(), before);
}

#[test]
fn shuffle_on_then_off_restores_identity() {
    let (mut c, _probe) = start(6, 0);
    c.toggle_shuffle();
    c.toggle_shuffle();
    assert!(!c.is_shuffle_enabled());
    assert_eq!(c.active_order(), (0..6).collect::<Vec<_>>());
}

#[test]
fn next_follows_the_shuffled_order() {
    let (mut c, probe) = start(5, 0);
    c.toggle_shuffle();
    let order = c.active_order();

    c.next().unwrap();
    assert_eq!(
        loads(&probe).last().cloned(),
        Some(PathBuf::from(format!("/music/{}.mp3", order[1])))
    );
}

#[test]
fn toggle_repeat_reconfigures_the_engine() {
    let (mut c, probe) = start(2, 0);
    c.toggle_repeat().unwrap();
    assert!(c.is_repeat_enabled());
    assert!(probe.borrow().looping);

    c.toggle_repeat().unwrap();
    assert!(!c.is_repeat_enabled());
    assert!(!probe.borrow().looping);
}

#[test]
fn failed_repeat_toggle_keeps_the_old_flag() {
    let (mut c, probe) = start(2, 0);
    probe.borrow_mut().broken = true;
    assert!(c.toggle_repeat().is_err());
    assert!(!c.is_repeat_enabled());
}

#[test]
fn ended_with_repeat_keeps_position_and_loops() {
    let (mut c, probe) = start(3, 1);
    c.toggle_repeat().unwrap();
    probe.borrow_mut().calls.clear();

    c.on_engine_event(ended(&probe)).unwrap();

    assert_eq!(c.position(), 1);
    assert!(probe.borrow().looping);
    assert!(loads(&probe).is_empty());
    assert_eq!(
        probe.borrow().calls,
        vec![Call::SetLoopMode(true), Call::SeekTo(0), Call::Play]
    );
}

#[test]
fn ended_without_repeat_advances_with_wraparound() {
    let (mut c, probe) = start(3, 2);
    c.on_engine_event(ended(&probe)).unwrap();
    assert_eq!(c.position(), 0);
    assert_eq!(
        loads(&probe).last().cloned(),
        Some(PathBuf::from("/music/0.mp3"))
    );
}

#[test]
fn toggle_play_pause_follows_engine_state() {
    let (mut c, probe) = start(1, 0);
    assert!(probe.borrow().playing);

    c.toggle_play_pause().unwrap();
    assert!(!probe.borrow().playing);
    assert_eq!(probe.borrow().calls.last(), Some(&Call::Pause));

    c.toggle_play_pause().unwrap();
    assert!(probe.borrow().playing);
    assert_eq!(probe.borrow().calls.last(), Some(&Call::Play));
}

#[test]
fn seek_clamps_out_of_range_fractions() {
    let (mut c, probe) = start(1, 0);
    c.on_engine_event(ready(&probe, 200_000))
        .unwrap();

    c.seek(-0.3).unwrap();
    assert_eq!(probe.borrow().calls.last(), Some(&Call::SeekTo(0)));
    assert_eq!(c.elapsed_ms(), 0);

    c.seek(1.7).unwrap();
    assert_eq!(probe.borrow().calls.last(), Some(&Call::SeekTo(200_000)));
    assert_eq!(c.elapsed_ms(), 200_000);
    assert_eq!(c.progress(), 1.0);

    c.seek(f64::NAN).unwrap();
    assert_eq!(c.elapsed_ms(), 0);
}

#[test]
fn seek_before_ready_targets_zero() {
    let (mut c, probe) = start(1, 0);
    c.seek(0.8).unwrap();
    assert_eq!(probe.borrow().calls.last(), Some(&Call::SeekTo(0)));
    assert_eq!(c.progress(), 0.0);
}

#[test]
fn playing_changed_starts_and_stops_the_ticker() {
    let (mut c, _probe) = start(2, 0);
    assert!(!c.is_ticking());

    c.on_engine_event(EngineEvent::PlayingChanged(true)).unwrap();
    assert!(c.is_playing());
    assert!(c.is_ticking());

    // A second notification must not spawn another loop.
    c.on_engine_event(EngineEvent::PlayingChanged(true)).unwrap();
    assert!(c.is_ticking());

    c.on_engine_event(EngineEvent::PlayingChanged(false))
        .unwrap();
    assert!(!c.is_playing());
    assert!(!c.is_ticking());
}

#[test]
fn tick_samples_engine_position_only_while_playing() {
    let (mut c, probe) = start(1, 0);
    c.on_engine_event(ready(&probe, 10_000))
        .unwrap();
    probe.borrow_mut().position_ms = 2_500;

    c.on_tick();
    assert_eq!(c.elapsed_ms(), 0);

    c.on_engine_event(EngineEvent::PlayingChanged(true)).unwrap();
    c.on_tick();
    assert_eq!(c.elapsed_ms(), 2_500);
    assert!((c.progress() - 0.25).abs() < 1e-9);
}

#[test]
fn engine_error_is_surfaced_without_moving() {
    let (mut c, probe) = start(3, 1);
    let loads_before = loads(&probe).len();

    c.on_engine_event(failed(&probe, "cannot decode"))
        .unwrap();
    assert_eq!(c.position(), 1);
    assert_eq!(c.last_error(), Some("cannot decode"));
    assert_eq!(loads(&probe).len(), loads_before);

    // The next explicit command clears it.
    c.next().unwrap();
    assert_eq!(c.last_error(), None);
}

#[test]
fn ended_from_the_previous_track_does_not_skip_again() {
    let (mut c, probe) = start(4, 0);
    let stale = ended(&probe);

    c.next().unwrap();
    c.on_engine_event(stale).unwrap();

    assert_eq!(c.position(), 1);
    assert_eq!(
        loads(&probe),
        vec![PathBuf::from("/music/0.mp3"), PathBuf::from("/music/1.mp3")]
    );
}

#[test]
fn ready_and_error_from_the_previous_track_are_ignored() {
    let (mut c, probe) = start(3, 0);
    let stale_ready = ready(&probe, 30_000);
    let stale_error = failed(&probe, "cannot decode");

    c.next().unwrap();
    c.on_engine_event(ready(&probe, 90_000)).unwrap();
    c.on_engine_event(stale_ready).unwrap();
    c.on_engine_event(stale_error).unwrap();

    assert_eq!(c.duration_ms(), 90_000);
    assert_eq!(c.last_error(), None);
}

#[test]
fn each_load_gets_a_new_id() {
    let (mut c, probe) = start(2, 0);
    let first = probe.borrow().load;
    c.next().unwrap();
    c.previous().unwrap();
    assert_eq!(probe.borrow().load, first + 2);
}

#[test]
fn toggle_play_pause_reads_the_engine_not_the_cached_flag() {
    let (mut c, probe) = start(1, 0);
    // No PlayingChanged yet, so the controller still thinks it is paused.
    assert!(!c.is_playing());

    c.toggle_play_pause().unwrap();
    assert_eq!(probe.borrow().calls.last(), Some(&Call::Pause));
}

#[test]
fn snapshot_reflects_state() {
    let (mut c, probe) = start(3, 2);
    c.on_engine_event(ready(&probe, 4_000))
        .unwrap();
    c.on_engine_event(EngineEvent::PlayingChanged(true)).unwrap();
    c.seek(0.5).unwrap();

    let snap = c.snapshot();
    assert_eq!(snap.track.id, "2.mp3");
    assert_eq!(snap.position, 2);
    assert_eq!(snap.len, 3);
    assert!(snap.playing);
    assert!(!snap.shuffle);
    assert!(!snap.repeat);
    assert_eq!(snap.elapsed_ms, 2_000);
    assert_eq!(snap.duration_ms, 4_000);
    assert!((snap.progress - 0.5).abs() < 1e-9);
    assert_eq!(snap.last_error, None);
}

#[test]
fn dropping_the_session_releases_engine_once_and_stops_ticking() {
    let (mut c, probe) = start(2, 0);
    c.on_engine_event(EngineEvent::PlayingChanged(true)).unwrap();
    drop(c);
    assert_eq!(probe.borrow().released, 1);
}

#[test]
fn ticker_notifies_until_stopped() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let mut ticker = Ticker::new(Duration::from_millis(5), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    ticker.start();
    std::thread::sleep(Duration::from_millis(60));
    ticker.stop();
    let after_stop = hits.load(Ordering::SeqCst);
    assert!(after_stop > 0);

    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(hits.load(Ordering::SeqCst), after_stop);
    assert!(!ticker.is_running());
}

#[test]
fn format_mmss_pads_and_does_not_cap_minutes() {
    assert_eq!(format_mmss(0), "00:00");
    assert_eq!(format_mmss(59_999), "00:59");
    assert_eq!(format_mmss(61_000), "01:01");
    assert_eq!(format_mmss(6_000_000), "100:00");
}

#[test]
fn progress_is_zero_without_duration() {
    assert_eq!(progress_fraction(5_000, 0), 0.0);
    assert_eq!(progress_fraction(0, 1_000), 0.0);
    assert_eq!(progress_fraction(2_000, 1_000), 1.0);
}

#[test]
fn play_order_wraps_in_both_directions() {
    let order = PlayOrder::Shuffled(vec![2, 0, 1]);
    assert_eq!(order.track_index(0), 2);
    assert_eq!(order.next_position(2), 0);
    assert_eq!(order.previous_position(0), 2);
}

proptest! {
    #[test]
    fn next_len_times_returns_to_start(len in 1usize..40, start_seed in 0usize..1000, shuffle in any::<bool>()) {
        let index = start_seed % len;
        let (mut c, _probe) = start(len, index);
        if shuffle {
            c.toggle_shuffle();
        }
        for _ in 0..len {
            c.next().unwrap();
        }
        prop_assert_eq!(c.position(), index);
    }

    #[test]
    fn previous_undoes_next(len in 1usize..40, start_seed in 0usize..1000, shuffle in any::<bool>()) {
        let index = start_seed % len;
        let (mut c, _probe) = start(len, index);
        if shuffle {
            c.toggle_shuffle();
        }
        let track_before = c.current_track().id.clone();
        c.next().unwrap();
        c.previous().unwrap();
        prop_assert_eq!(c.position(), index);
        prop_assert_eq!(&c.current_track().id, &track_before);
    }

    #[test]
    fn shuffled_order_is_a_permutation(len in 1usize..200) {
        let mut order = PlayOrder::shuffled(len).indices();
        order.sort_unstable();
        prop_assert_eq!(order, (0..len).collect::<Vec<_>>());
    }

    #[test]
    fn progress_stays_in_unit_range(elapsed in any::<u64>(), duration in any::<u64>()) {
        let p = progress_fraction(elapsed, duration);
        prop_assert!((0.0..=1.0).contains(&p));
        if duration == 0 {
            prop_assert_eq!(p, 0.0);
        }
    }

    #[test]
    fn seek_matches_clamped_seek(fraction in -10.0f64..10.0, duration in 0u64..10_000_000) {
        let (mut a, probe_a) = start(1, 0);
        let (mut b, probe_b) = start(1, 0);
        a.on_engine_event(ready(&probe_a, duration)).unwrap();
        b.on_engine_event(ready(&probe_b, duration)).unwrap();

        a.seek(fraction).unwrap();
        b.seek(fraction.clamp(0.0, 1.0)).unwrap();
        prop_assert_eq!(a.elapsed_ms(), b.elapsed_ms());
        let (calls_a, calls_b) = (probe_a.borrow(), probe_b.borrow());
        prop_assert_eq!(calls_a.calls.last(), calls_b.calls.last());
        drop((calls_a, calls_b));
        prop_assert!(a.elapsed_ms() <= duration);
    }
}
