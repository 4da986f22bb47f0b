use std::path::Path;

use tracing::debug;

use super::model::Deck;
use crate::error::DeckError;

impl Deck {
    /// Read and validate a deck file.
    pub fn load(path: &Path) -> Result<Self, DeckError> {
        let text = std::fs::read_to_string(path).map_err(|source| DeckError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parse deck TOML. `origin` is only used in error messages.
    pub fn parse(text: &str, origin: &Path) -> Result<Self, DeckError> {
        let mut deck: Deck = toml::from_str(text).map_err(|source| DeckError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        deck.validate()?;
        // Stable: unindexed slides keep their file order after the indexed ones.
        deck.reasons
            .sort_by_key(|r| (r.order_index.is_none(), r.order_index));
        debug!(
            path = %origin.display(),
            slides = deck.reasons.len(),
            "deck loaded"
        );
        Ok(deck)
    }

    fn validate(&self) -> Result<(), DeckError> {
        if self.reasons.is_empty() {
            return Err(DeckError::Empty);
        }
        if let Some((index, reason)) = self
            .reasons
            .iter()
            .enumerate()
            .find(|(_, r)| r.audio_file.trim().is_empty())
        {
            return Err(DeckError::MissingAudio {
                index,
                title: reason.title.clone(),
            });
        }
        if self.finale.audio_file.trim().is_empty() {
            return Err(DeckError::MissingFinaleAudio);
        }
        Ok(())
    }
}
