use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::{App, Screen, SessionEvent};
use crate::config::Settings;
use crate::engine::{EventListener, MediaEngine};
use crate::error::EngineError;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::runtime::mpris_sync::{MprisView, update_mpris};
use crate::runtime::startup::start_session;
use crate::ui;

const INPUT_POLL: Duration = Duration::from_millis(50);

/// Everything the loop needs besides the app model.
pub struct LoopContext<'a, E> {
    pub settings: &'a Settings,
    pub session_tx: &'a Sender<SessionEvent>,
    pub open_engine: &'a dyn Fn(EventListener) -> Result<E, EngineError>,
}

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// What MPRIS clients were last told.
    pub last_mpris: MprisView,
}

/// Main terminal event loop: draws, applies session events, MPRIS commands
/// and key presses. Returns `Ok(())` when shutdown is requested.
pub fn run<E: MediaEngine>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    ctx: &LoopContext<'_, E>,
    app: &mut App<E>,
    mpris: &MprisHandle,
    session_rx: &Receiver<SessionEvent>,
    control_rx: &Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.tick_splash(Instant::now());
        terminal.draw(|f| ui::draw(f, app, ctx.settings))?;

        while let Ok(ev) = session_rx.try_recv() {
            if !app.handle_session_event(ev) {
                debug!("dropped event of a closed session");
            }
        }

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, ctx, app) {
                return Ok(());
            }
        }

        update_mpris(mpris, app, &mut state.last_mpris);

        if event::poll(INPUT_POLL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, ctx, app, state) {
                    return Ok(());
                }
                update_mpris(mpris, app, &mut state.last_mpris);
            }
        }
    }
}

/// Apply an MPRIS command. Returns true when the app should quit.
pub fn handle_control_cmd<E: MediaEngine>(
    cmd: ControlCmd,
    ctx: &LoopContext<'_, E>,
    app: &mut App<E>,
) -> bool {
    debug!(?cmd, "MPRIS command");
    let playing = app
        .session()
        .map(|s| s.controller.is_playing())
        .unwrap_or(false);

    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play | ControlCmd::PlayPause if !app.has_session() => {
            start_session(app, ctx.settings, ctx.session_tx, ctx.open_engine);
        }
        ControlCmd::Play => {
            if !playing {
                app.control(|c| c.toggle_play_pause());
            }
        }
        ControlCmd::Pause => {
            if playing {
                app.control(|c| c.toggle_play_pause());
            }
        }
        ControlCmd::PlayPause => app.control(|c| c.toggle_play_pause()),
        ControlCmd::Stop => app.close_session(),
        ControlCmd::Next => app.control(|c| c.next()),
        ControlCmd::Prev => app.control(|c| c.previous()),
        ControlCmd::SetShuffle(on) => app.control(|c| {
            if c.is_shuffle_enabled() != on {
                c.toggle_shuffle();
            }
            Ok(())
        }),
        ControlCmd::SetRepeat(on) => app.control(|c| {
            if c.is_repeat_enabled() != on {
                c.toggle_repeat()?;
            }
            Ok(())
        }),
    }

    false
}

/// Apply a key press to the screen in front. Returns true when the app
/// should quit.
pub fn handle_key_event<E: MediaEngine>(
    key: KeyEvent,
    ctx: &LoopContext<'_, E>,
    app: &mut App<E>,
    state: &mut EventLoopState,
) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match app.screen {
        Screen::Splash { .. } => {
            app.skip_splash();
            false
        }
        Screen::Library => handle_library_key(key, ctx, app, state),
        Screen::Player => {
            state.pending_gg = false;
            handle_player_key(key, ctx, app);
            false
        }
    }
}

fn handle_library_key<E: MediaEngine>(
    key: KeyEvent,
    ctx: &LoopContext<'_, E>,
    app: &mut App<E>,
    state: &mut EventLoopState,
) -> bool {
    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Enter => start_session(app, ctx.settings, ctx.session_tx, ctx.open_engine),
        _ => {}
    }

    false
}

fn handle_player_key<E: MediaEngine>(key: KeyEvent, ctx: &LoopContext<'_, E>, app: &mut App<E>) {
    let scrub = i16::from(ctx.settings.controls.scrub_percent);

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.close_session(),
        KeyCode::Char(' ') | KeyCode::Char('p') => app.control(|c| c.toggle_play_pause()),
        KeyCode::Char('l') | KeyCode::Char('n') => app.control(|c| c.next()),
        KeyCode::Char('h') | KeyCode::Char('b') => app.control(|c| c.previous()),
        KeyCode::Char('s') => app.control(|c| {
            c.toggle_shuffle();
            Ok(())
        }),
        KeyCode::Char('r') => app.control(|c| c.toggle_repeat()),
        KeyCode::Char('L') => app.scrub(scrub),
        KeyCode::Char('H') => app.scrub(-scrub),
        KeyCode::Char(d) if d.is_ascii_digit() => app.seek_to_tenth(d as u8 - b'0'),
        _ => {}
    }
}
