use std::io::Stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::input::{self, Action, Input};
use crate::app::{App, Cue};
use crate::audio::AudioCoordinator;
use crate::config;
use crate::ui;

const REDRAW_EVERY: Duration = Duration::from_millis(100);

/// Main terminal event loop: handles input, timers, coordinator status and
/// events, and redraws. Returns `Ok(())` when the user quits.
pub async fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    coordinator: &AudioCoordinator,
) -> Result<()> {
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    input::spawn_input_thread(input_tx);

    let mut status_rx = coordinator.subscribe_status();
    let mut events = coordinator.subscribe_events();
    app.set_audio_status(*status_rx.borrow_and_update());

    let advance_every = Duration::from_millis(settings.presentation.advance_interval_ms);
    let mut advance = time::interval_at(Instant::now() + advance_every, advance_every);
    advance.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut redraw = time::interval(REDRAW_EVERY);
    redraw.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Tries to start the music without waiting for a key once audio is ready.
    let autoplay_delay = Duration::from_millis(settings.presentation.autoplay_delay_ms);
    let autoplay = time::sleep(autoplay_delay);
    tokio::pin!(autoplay);
    let mut autoplay_armed = app.audio.ready;

    loop {
        terminal.draw(|f| ui::draw(f, app, &settings.ui, std::time::Instant::now()))?;

        tokio::select! {
            input = input_rx.recv() => match input {
                Some(Input::Key(key)) => {
                    if handle_key(key, app, coordinator, &mut advance) {
                        info!("quit requested");
                        break;
                    }
                }
                Some(Input::Resize) => {}
                None => {
                    warn!("input thread stopped");
                    break;
                }
            },

            _ = advance.tick() => {
                play_cue(coordinator, app.advance(std::time::Instant::now()));
            }

            () = &mut autoplay, if autoplay_armed => {
                autoplay_armed = false;
                play_cue(coordinator, app.initialize_audio());
            }

            changed = status_rx.changed() => {
                if changed.is_err() {
                    continue;
                }
                let status = *status_rx.borrow_and_update();
                debug!(?status, "audio status changed");
                app.set_audio_status(status);
                if status.ready && !app.audio_initialized && !autoplay_armed {
                    autoplay.as_mut().reset(Instant::now() + autoplay_delay);
                    autoplay_armed = true;
                }
            }

            event = events.recv() => match event {
                Ok(event) => app.on_audio_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "audio events dropped");
                }
                Err(RecvError::Closed) => {}
            },

            _ = redraw.tick() => {}
        }
    }

    Ok(())
}

/// Apply one key press. Returns `true` when the user asked to quit.
fn handle_key(
    key: KeyEvent,
    app: &mut App,
    coordinator: &AudioCoordinator,
    advance: &mut Interval,
) -> bool {
    let action = input::action_for(key);
    if action == Some(Action::Quit) {
        app.should_quit = true;
        return true;
    }

    let now = std::time::Instant::now();
    // Any key starts the music, or retries it after a blocked start.
    let cue = app.interact();
    let cue = match action {
        Some(Action::Next) => app.next(now).or(cue),
        Some(Action::Prev) => app.prev(now).or(cue),
        Some(Action::GoTo(index)) => app.go_to(index, now).or(cue),
        Some(Action::ShowFinal) => app.show_final().or(cue),
        Some(Action::HideFinal) => app.hide_final().or(cue),
        Some(Action::ToggleAutoAdvance) => {
            app.toggle_auto_advance();
            if app.auto_advance {
                advance.reset();
            }
            cue
        }
        Some(Action::Quit) | None => cue,
    };
    play_cue(coordinator, cue);
    false
}

fn play_cue(coordinator: &AudioCoordinator, cue: Cue) {
    let Some(reference) = cue else {
        return;
    };
    match coordinator.play(&reference) {
        Ok(started) => {
            // The outcome also arrives as an event; nothing to wait for here.
            tokio::spawn(started);
        }
        Err(e) => warn!(%reference, error = %e, "cannot play track"),
    }
}
