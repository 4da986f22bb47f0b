//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use std::{collections::BTreeMap, sync::LazyLock, time::Instant};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style, Stylize},
    text::{Line, Text},
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
};

use crate::app::{App, LoadTally, Section};
use crate::config::UiSettings;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("h/l", "prev/next");
    map.insert("1-9/0", "jump");
    map.insert("j/k", "finale/back");
    map.insert("a", "auto-advance");
    map.insert("q", "quit");
    map
});

/// Render the controls help text.
fn controls_text() -> String {
    // Keep the rendered order stable and human-friendly.
    let order = ["h/l", "1-9/0", "j/k", "a", "q"];
    order
        .iter()
        .filter_map(|k| CONTROLS_MAP.get(k).map(|v| format!("[{}] {}", k, v)))
        .collect::<Vec<String>>()
        .join(" | ")
}

fn tally_text(tally: LoadTally) -> String {
    if tally.total() == 0 {
        return String::new();
    }
    let mut text = format!("tracks loaded {}/{}", tally.loaded, tally.total());
    if tally.failed > 0 {
        text.push_str(&format!(", {} failed", tally.failed));
    }
    text
}

/// One dot per slide, the current one filled.
fn counter_dots(current: usize, len: usize) -> String {
    (0..len)
        .map(|i| if i == current { "●" } else { "○" })
        .collect::<Vec<_>>()
        .join(" ")
}

fn side_padding() -> Padding {
    Padding {
        left: 1,
        right: 1,
        top: 0,
        bottom: 0,
    }
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(frame: &mut Frame, app: &App, ui_settings: &UiSettings, now: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let title = if app.deck.title.trim().is_empty() {
        ui_settings.header_text.as_str()
    } else {
        app.deck.title.as_str()
    };
    let header = Paragraph::new(Text::from(vec![
        Line::from(title.bold()),
        Line::from(app.deck.subtitle.as_str().italic()),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" serenata ")
            .title_alignment(Alignment::Center),
    );
    frame.render_widget(header, chunks[0]);

    // Status box
    let status = {
        let mut parts: Vec<String> = Vec::new();
        match app.section {
            Section::Reasons => parts.push(format!(
                "SLIDE: {}/{}",
                app.current + 1,
                app.deck.len()
            )),
            Section::Final => parts.push("FINALE".to_string()),
        }
        if app.auto_advance {
            parts.push("AUTO: On".to_string());
        } else {
            parts.push("AUTO: Off".to_string());
        }
        let hint = app.audio_hint();
        if !hint.is_empty() {
            parts.push(hint);
        }
        parts.join(" • ")
    };
    let mut status_par = Paragraph::new(status)
        .block(Block::bordered().padding(side_padding()).title(" status "))
        .wrap(Wrap { trim: true });
    if app.audio.loading {
        status_par = status_par.slow_blink();
    }
    frame.render_widget(status_par, chunks[1]);

    // Main card
    match app.section {
        Section::Reasons => {
            let mut lines: Vec<Line> = Vec::new();
            if let Some(reason) = app.current_reason() {
                lines.push(Line::from(reason.title.as_str().bold()));
                lines.push(Line::default());
                lines.push(Line::from(reason.description.as_str()));
                lines.push(Line::default());
                if !reason.song.trim().is_empty() {
                    lines.push(Line::from(format!("♪ {}", reason.song).italic()));
                }
                if ui_settings.show_image_path {
                    if let Some(image) = reason.image.as_deref() {
                        lines.push(Line::from(format!("[image: {image}]").dim()));
                    }
                }
            }
            let mut card = Paragraph::new(Text::from(lines))
                .alignment(Alignment::Center)
                .block(Block::bordered().padding(side_padding()).title(" reason "))
                .wrap(Wrap { trim: true });
            if app.is_transitioning(now) {
                card = card.style(Style::default().add_modifier(Modifier::DIM));
            }
            frame.render_widget(card, chunks[2]);
        }
        Section::Final => {
            let finale = &app.deck.finale;
            let mut lines = vec![
                Line::from(finale.heading.as_str().bold()),
                Line::default(),
                Line::from(finale.message.as_str()),
                Line::default(),
            ];
            if !finale.song.trim().is_empty() {
                lines.push(Line::from(format!("♪ {}", finale.song).italic()));
            }
            let panel = Paragraph::new(Text::from(lines))
                .alignment(Alignment::Center)
                .block(
                    Block::bordered()
                        .padding(side_padding())
                        .title(" finale (k returns) "),
                )
                .wrap(Wrap { trim: true });
            frame.render_widget(panel, chunks[2]);
        }
    }

    // Slide counter
    let dots = Paragraph::new(counter_dots(app.current, app.deck.len()))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(dots, chunks[3]);

    let mut footer_text = controls_text();
    let tally = tally_text(app.ledger.tally());
    if !tally.is_empty() {
        footer_text.push_str(" • ");
        footer_text.push_str(&tally);
    }
    let footer = Paragraph::new(footer_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(side_padding()),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[4]);
}
