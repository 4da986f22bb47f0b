//! Terminal input: a blocking reader thread and the key bindings.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Key(KeyEvent),
    Resize,
}

/// What a key press asks the presentation to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Next,
    Prev,
    GoTo(usize),
    ShowFinal,
    HideFinal,
    ToggleAutoAdvance,
    Quit,
}

pub fn action_for(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char('l') | KeyCode::Right => Some(Action::Next),
        KeyCode::Char('h') | KeyCode::Left => Some(Action::Prev),
        KeyCode::Char('j') | KeyCode::Down => Some(Action::ShowFinal),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::HideFinal),
        KeyCode::Char('a') => Some(Action::ToggleAutoAdvance),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        // `0` is the tenth slide.
        KeyCode::Char('0') => Some(Action::GoTo(9)),
        KeyCode::Char(c @ '1'..='9') => Some(Action::GoTo(c as usize - '1' as usize)),
        _ => None,
    }
}

/// Forward terminal events until the receiver goes away.
pub fn spawn_input_thread(tx: UnboundedSender<Input>) -> JoinHandle<()> {
    thread::spawn(move || {
        loop {
            match event::poll(Duration::from_millis(100)) {
                Ok(true) => {
                    let input = match event::read() {
                        Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Input::Key(key),
                        Ok(Event::Resize(..)) => Input::Resize,
                        Ok(_) => continue,
                        Err(e) => {
                            warn!(error = %e, "reading terminal input failed");
                            break;
                        }
                    };
                    if tx.send(input).is_err() {
                        break;
                    }
                }
                Ok(false) => {
                    if tx.is_closed() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "polling terminal input failed");
                    break;
                }
            }
        }
    })
}
