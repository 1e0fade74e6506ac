use std::env;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::{App, SessionEvent};
use crate::engine::{EventListener, RodioEngine};
use crate::error::EngineError;
use crate::library::scan;
use crate::logging;
use crate::mpris::ControlCmd;

mod event_loop;
mod mpris_sync;
mod settings;
mod startup;


pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, settings_warning) = settings::load_settings();

    // Logging is best effort; the player runs without it.
    let _log_guard = logging::init(&settings).unwrap_or_else(|e| {
        eprintln!("spindle: logging disabled: {e}");
        None
    });
    if let Some(msg) = settings_warning {
        warn!("{msg}");
    }

    let dir = env::args().nth(1).unwrap_or_else(|| {
        env::current_dir()
            .ok()
            .and_then(|p| p.to_str().map(|s| s.to_string()))
            .unwrap_or_else(|| ".".to_string())
    });

    let tracks = scan(Path::new(&dir), &settings.library);

    let mut app: App<RodioEngine> =
        App::new(tracks, Duration::from_millis(settings.ui.splash_ms));
    app.set_current_dir(dir);

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);
    let (session_tx, session_rx) = mpsc::channel::<SessionEvent>();

    let open_engine = |listener: EventListener| -> Result<RodioEngine, EngineError> {
        RodioEngine::new(&settings.audio, listener)
    };
    let ctx = event_loop::LoopContext {
        settings: &settings,
        session_tx: &session_tx,
        open_engine: &open_engine,
    };

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::default();
        event_loop::run(
            &mut terminal,
            &ctx,
            &mut app,
            &mpris,
            &session_rx,
            &control_rx,
            &mut state,
        )
    })();

    // Release the engine (with its fade-out) before the terminal comes back.
    app.close_session();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &run_result {
        warn!(error = %e, "event loop failed");
    }
    info!("shutting down");
    run_result
}
