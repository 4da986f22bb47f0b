//! Application model types: `App`, `Section` and `SoundState`.
//!
//! `App` is a plain state machine. It never talks to the audio coordinator
//! itself: state changes that should switch the music return a cue (the
//! track reference to play) and the runtime forwards it.

use std::time::{Duration, Instant};

use super::ledger::LoadLedger;
use crate::audio::{AudioEvent, AudioStatus};
use crate::deck::{Deck, Reason};

/// Which part of the presentation is on screen.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Reasons,
    Final,
}

/// What the audio side last said about the current track.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum SoundState {
    #[default]
    Silent,
    /// Accepted; waiting for the data.
    Waiting,
    Playing,
    /// The backend refused to start. The next key press retries.
    Blocked,
}

/// Track reference the runtime should hand to `AudioCoordinator::play`.
pub type Cue = Option<String>;

/// The presentation model.
pub struct App {
    pub deck: Deck,
    pub current: usize,
    pub auto_advance: bool,
    pub section: Section,
    pub audio_initialized: bool,
    pub sound: SoundState,
    pub audio: AudioStatus,
    pub ledger: LoadLedger,
    pub should_quit: bool,

    transition: Duration,
    transition_until: Option<Instant>,
}

impl App {
    /// Create an `App` showing the first slide. `deck` must not be empty.
    pub fn new(deck: Deck, auto_advance: bool, transition: Duration) -> Self {
        Self {
            deck,
            current: 0,
            auto_advance,
            section: Section::Reasons,
            audio_initialized: false,
            sound: SoundState::Silent,
            audio: AudioStatus::default(),
            ledger: LoadLedger::default(),
            should_quit: false,
            transition,
            transition_until: None,
        }
    }

    pub fn current_reason(&self) -> Option<&Reason> {
        self.deck.reason(self.current)
    }

    /// The track that belongs to what is on screen.
    pub fn current_track(&self) -> Option<&str> {
        match self.section {
            Section::Final => Some(self.deck.finale.audio_file.as_str()),
            Section::Reasons => self.current_reason().map(|r| r.audio_file.as_str()),
        }
    }

    /// Song name of the track that belongs to what is on screen.
    pub fn current_song(&self) -> Option<&str> {
        match self.section {
            Section::Final => Some(self.deck.finale.song.as_str()),
            Section::Reasons => self.current_reason().map(|r| r.song.as_str()),
        }
    }

    pub fn next(&mut self, now: Instant) -> Cue {
        self.auto_advance = false;
        let len = self.deck.len().max(1);
        self.change_to((self.current + 1) % len, now)
    }

    pub fn prev(&mut self, now: Instant) -> Cue {
        self.auto_advance = false;
        let len = self.deck.len().max(1);
        self.change_to((self.current + len - 1) % len, now)
    }

    /// Jump to slide `index`. Out-of-range indices are ignored.
    pub fn go_to(&mut self, index: usize, now: Instant) -> Cue {
        if index >= self.deck.len() {
            return None;
        }
        self.auto_advance = false;
        self.change_to(index, now)
    }

    /// One tick of the auto-advance timer.
    ///
    /// Advances only once audio is initialized, wrapping after the last slide.
    pub fn advance(&mut self, now: Instant) -> Cue {
        if !self.auto_advance || !self.audio_initialized {
            return None;
        }
        let len = self.deck.len().max(1);
        self.change_to((self.current + 1) % len, now)
    }

    fn change_to(&mut self, index: usize, now: Instant) -> Cue {
        if index == self.current {
            return None;
        }
        self.current = index;
        self.transition_until = Some(now + self.transition);
        if self.audio_initialized && self.section == Section::Reasons {
            self.current_track().map(str::to_string)
        } else {
            None
        }
    }

    pub fn is_transitioning(&self, now: Instant) -> bool {
        self.transition_until.is_some_and(|until| now < until)
    }

    pub fn show_final(&mut self) -> Cue {
        self.set_section(Section::Final)
    }

    pub fn hide_final(&mut self) -> Cue {
        self.set_section(Section::Reasons)
    }

    fn set_section(&mut self, section: Section) -> Cue {
        if self.section == section {
            return None;
        }
        self.section = section;
        self.cue_current()
    }

    pub fn toggle_auto_advance(&mut self) {
        self.auto_advance = !self.auto_advance;
    }

    /// Start the music, once the first preload batch is through.
    pub fn initialize_audio(&mut self) -> Cue {
        if self.audio_initialized || !self.audio.ready {
            return None;
        }
        self.audio_initialized = true;
        self.current_track().map(str::to_string)
    }

    /// Called on every key press before the key's own action.
    ///
    /// The first press after audio is ready starts the music; a press after a
    /// blocked start tries the current track again.
    pub fn interact(&mut self) -> Cue {
        if !self.audio_initialized {
            return self.initialize_audio();
        }
        if self.sound == SoundState::Blocked {
            return self.cue_current();
        }
        None
    }

    fn cue_current(&self) -> Cue {
        if self.audio_initialized {
            self.current_track().map(str::to_string)
        } else {
            None
        }
    }

    pub fn set_audio_status(&mut self, status: AudioStatus) {
        self.audio = status;
    }

    pub fn on_audio_event(&mut self, event: &AudioEvent) {
        self.ledger.record(event);

        let current = self.current_track();
        let is_current = |reference: &crate::audio::TrackRef| Some(reference.as_str()) == current;
        let sound = match event {
            AudioEvent::PlayStarted { reference } if is_current(reference) => SoundState::Playing,
            AudioEvent::PlayDeferred { reference } if is_current(reference) => SoundState::Waiting,
            AudioEvent::PlayBlocked { reference, .. } if is_current(reference) => {
                SoundState::Blocked
            }
            AudioEvent::TornDown { .. } => SoundState::Silent,
            _ => return,
        };
        self.sound = sound;
    }

    /// One-line audio hint shown under the header.
    pub fn audio_hint(&self) -> String {
        if self.audio.loading {
            return "Loading audio...".to_string();
        }
        if !self.audio_initialized {
            return if self.audio.ready {
                "Press any key to start music".to_string()
            } else {
                String::new()
            };
        }
        let song = self.current_song().unwrap_or_default();
        match self.sound {
            SoundState::Playing => format!("Now playing: {song}"),
            SoundState::Waiting => format!("Buffering {song}..."),
            SoundState::Blocked => "Sound unavailable, press any key to retry".to_string(),
            SoundState::Silent => String::new(),
        }
    }
}
