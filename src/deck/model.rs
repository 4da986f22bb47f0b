use std::collections::HashSet;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Deck {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub reasons: Vec<Reason>,
    pub finale: Finale,
}

/// One slide.
#[derive(Debug, Clone, Deserialize)]
pub struct Reason {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Song name shown on the card.
    #[serde(default)]
    pub song: String,
    /// Track reference handed to the audio coordinator.
    #[serde(default)]
    pub audio_file: String,
    /// Position in the deck. Slides without one follow the indexed ones.
    #[serde(default)]
    pub order_index: Option<i64>,
}

/// Closing section shown after the last slide.
#[derive(Debug, Clone, Deserialize)]
pub struct Finale {
    pub heading: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub song: String,
    #[serde(default)]
    pub audio_file: String,
}

impl Deck {
    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn reason(&self, index: usize) -> Option<&Reason> {
        self.reasons.get(index)
    }

    /// Every track reference in slide order, then the finale's, without repeats.
    pub fn audio_files(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.reasons
            .iter()
            .map(|r| r.audio_file.as_str())
            .chain(std::iter::once(self.finale.audio_file.as_str()))
            .filter(|r| seen.insert(*r))
            .collect()
    }
}
