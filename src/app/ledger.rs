use std::collections::HashMap;
use std::time::Duration;

use crate::audio::{AudioEvent, TrackRef};

/// What is known about one track's load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEntry {
    Loading,
    Loaded(Duration),
    Failed(String),
    /// The preload stopped waiting; the load may still finish.
    TimedOut,
}

/// Counts shown in the footer.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LoadTally {
    pub loaded: usize,
    pub failed: usize,
    pub pending: usize,
}

impl LoadTally {
    pub fn total(&self) -> usize {
        self.loaded + self.failed + self.pending
    }
}

/// Which tracks were loaded and how long each took, built from `AudioEvent`s.
#[derive(Debug, Default)]
pub struct LoadLedger {
    entries: HashMap<TrackRef, LoadEntry>,
}

impl LoadLedger {
    pub fn record(&mut self, event: &AudioEvent) {
        match event {
            AudioEvent::LoadStarted { reference } => {
                self.entries.insert(reference.clone(), LoadEntry::Loading);
            }
            AudioEvent::Loaded { reference, elapsed } => {
                self.entries
                    .insert(reference.clone(), LoadEntry::Loaded(*elapsed));
            }
            AudioEvent::LoadFailed { reference, reason } => {
                self.entries
                    .insert(reference.clone(), LoadEntry::Failed(reason.clone()));
            }
            AudioEvent::LoadTimedOut { reference } => {
                self.entries.insert(reference.clone(), LoadEntry::TimedOut);
            }
            AudioEvent::TornDown { .. } => self.entries.clear(),
            _ => {}
        }
    }

    pub fn get(&self, reference: &str) -> Option<&LoadEntry> {
        self.entries.get(reference)
    }

    pub fn tally(&self) -> LoadTally {
        self.entries
            .values()
            .fold(LoadTally::default(), |mut tally, entry| {
                match entry {
                    LoadEntry::Loaded(_) => tally.loaded += 1,
                    LoadEntry::Failed(_) => tally.failed += 1,
                    LoadEntry::Loading | LoadEntry::TimedOut => tally.pending += 1,
                }
                tally
            })
    }
}
