//! UI rendering for the terminal user interface.
//!
//! Three screens are drawn with `ratatui`: the splash, the song list and the
//! player. Rendering only reads the app model.

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph, Widget, Wrap},
};

use crate::app::{App, Screen, Session};
use crate::config::Settings;
use crate::engine::MediaEngine;
use crate::library::{ArtRef, Track};
use crate::player::format_mmss;
use crate::waveform::played_bars;

const LIBRARY_CONTROLS: &[(&str, &str)] = &[
    ("j/k", "up/down"),
    ("gg/G", "top/bottom"),
    ("enter", "play"),
    ("q", "quit"),
];

const PLAYER_CONTROLS: &[(&str, &str)] = &[
    ("space/p", "play/pause"),
    ("h/l", "prev/next"),
    ("s", "shuffle"),
    ("r", "repeat"),
    ("0-9", "jump"),
    ("esc/q", "back"),
];

const PLAYED: Color = Color::Cyan;
const UNPLAYED: Color = Color::DarkGray;

/// Render the controls help line for a screen.
fn controls_text(controls: &[(&str, &str)], scrub_percent: Option<u8>) -> String {
    let mut parts: Vec<String> = controls
        .iter()
        .map(|(k, v)| format!("[{k}] {v}"))
        .collect();
    if let Some(p) = scrub_percent {
        parts.insert(2, format!("[H/L] scrub -/+{p}%"));
    }
    parts.join(" | ")
}

/// Up to two uppercase initials for the cover placeholder.
fn initials(text: &str) -> String {
    let letters: String = text
        .split_whitespace()
        .filter_map(|w| w.chars().find(|c| c.is_alphanumeric()))
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

fn art_label(art: &ArtRef) -> String {
    match art {
        ArtRef::Embedded(path) => path
            .file_name()
            .map(|n| format!("art in {}", n.to_string_lossy()))
            .unwrap_or_else(|| "embedded art".to_string()),
        ArtRef::Folder(path) => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "folder art".to_string()),
        ArtRef::None => "no art".to_string(),
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width);
    height = height.min(r.height);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn footer_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

/// Render the entire UI into `frame`.
pub fn draw<E: MediaEngine>(frame: &mut Frame, app: &App<E>, settings: &Settings) {
    match (app.screen, app.session()) {
        (Screen::Splash { .. }, _) => draw_splash(frame, settings),
        (Screen::Player, Some(session)) => draw_player(frame, app, session, settings),
        _ => draw_library(frame, app, settings),
    }
}

fn draw_splash(frame: &mut Frame, settings: &Settings) {
    let area = centered_rect_sized(40, 5, frame.area());
    let text = format!("{}\n\nloading library", settings.ui.header_text);
    let splash = Paragraph::new(text)
        .alignment(Alignment::Center)
        .bold()
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(splash, area);
}

fn draw_library<E: MediaEngine>(frame: &mut Frame, app: &App<E>, settings: &Settings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header_line = match &app.current_dir {
        Some(dir) => format!("{} • {} tracks • {}", settings.ui.header_text, app.tracks.len(), dir),
        None => format!("{} • {} tracks", settings.ui.header_text, app.tracks.len()),
    };
    let header = Paragraph::new(header_line)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" spindle ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Only build ListItems for the visible window, centred on the selection.
    let total = app.tracks.len();
    let list_height = chunks[1].height.saturating_sub(2) as usize;
    let sel_pos = app.selected.min(total.saturating_sub(1));
    let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
        (0, total, sel_pos)
    } else {
        let half = list_height / 2;
        let mut start = sel_pos.saturating_sub(half);
        if start + list_height > total {
            start = total - list_height;
        }
        (start, start + list_height, sel_pos - start)
    };

    let visible_items: Vec<ListItem> = app.tracks[start..end]
        .iter()
        .map(|track| ListItem::new(list_line(track)))
        .collect();

    let list = List::new(visible_items)
        .block(Block::default().borders(Borders::ALL).title(" tracks "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if total > 0 {
        state.select(Some(selected_pos_in_visible));
    }
    frame.render_stateful_widget(list, chunks[1], &mut state);

    let footer_text = match &app.notice {
        Some(notice) => format!("{notice}\n{}", controls_text(LIBRARY_CONTROLS, None)),
        None => controls_text(LIBRARY_CONTROLS, None),
    };
    let footer = Paragraph::new(footer_text)
        .block(footer_block(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[2]);
}

fn list_line(track: &Track) -> String {
    match track.duration {
        Some(d) => format!("{}  [{}]", track.display(), format_mmss(d.as_millis() as u64)),
        None => track.display(),
    }
}

fn draw_player<E: MediaEngine>(
    frame: &mut Frame,
    app: &App<E>,
    session: &Session<E>,
    settings: &Settings,
) {
    let snap = session.controller.snapshot();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(7),
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(22), Constraint::Min(10)])
        .split(chunks[0]);

    let cover_source = snap.track.album.as_deref().unwrap_or(&snap.track.title);
    let cover = Paragraph::new(format!(
        "\n\n{}\n\n{}",
        initials(cover_source),
        art_label(&snap.track.album_art)
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title(" cover "));
    frame.render_widget(cover, top[0]);

    let details = format!(
        "{}\n{}\n{}\n\nTrack {} of {}",
        snap.track.title,
        snap.track.artist,
        snap.track.album.as_deref().unwrap_or(""),
        snap.position + 1,
        snap.len,
    );
    let details = Paragraph::new(details)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" now playing ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(details, top[1]);

    let wave_block = Block::default().borders(Borders::ALL);
    let wave_area = wave_block.inner(chunks[1]);
    frame.render_widget(wave_block, chunks[1]);
    frame.render_widget(
        WaveformBar {
            bars: &session.waveform,
            progress: snap.progress,
        },
        wave_area,
    );

    let status = format!(
        "{} / {}   {}   shuffle: {}   repeat: {}",
        format_mmss(snap.elapsed_ms),
        format_mmss(snap.duration_ms),
        if snap.playing { "playing" } else { "paused" },
        if snap.shuffle { "on" } else { "off" },
        if snap.repeat { "on" } else { "off" },
    );
    let status = Paragraph::new(status)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, chunks[2]);

    let controls = controls_text(PLAYER_CONTROLS, Some(settings.controls.scrub_percent));
    let notice = snap.last_error.or(app.notice.as_deref());
    let footer_text = match notice {
        Some(notice) => format!("{notice}\n{controls}"),
        None => controls,
    };
    let footer = Paragraph::new(footer_text)
        .block(footer_block(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}

/// Vertical bars stretched across the area; bars up to the progress
/// fraction are drawn in the played colour.
pub struct WaveformBar<'a> {
    pub bars: &'a [f32],
    pub progress: f64,
}

impl Widget for WaveformBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.bars.is_empty() || area.width == 0 || area.height == 0 {
            return;
        }
        let played = played_bars(self.bars.len(), self.progress);

        for col in 0..area.width {
            let idx = col as usize * self.bars.len() / area.width as usize;
            let height = (self.bars[idx] * area.height as f32).ceil() as u16;
            let height = height.clamp(1, area.height);
            let color = if idx < played { PLAYED } else { UNPLAYED };

            for row in 0..height {
                let y = area.y + area.height - 1 - row;
                if let Some(cell) = buf.cell_mut((area.x + col, y)) {
                    cell.set_char('█').set_fg(color);
                }
            }
        }
    }
}
