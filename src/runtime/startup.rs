use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::audio::AudioCoordinator;
use crate::config;
use crate::deck::Deck;

/// Pick the directory track references resolve against: the command line,
/// then `audio.media_root`, then the deck file's directory.
pub fn media_root(cli: Option<&Path>, settings: &config::Settings, deck_path: &Path) -> PathBuf {
    if let Some(root) = cli {
        return root.to_path_buf();
    }
    if let Some(root) = &settings.audio.media_root {
        return root.clone();
    }
    match deck_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Start preloading every track of the deck in the background.
pub fn spawn_preload(coordinator: &AudioCoordinator, deck: &Deck) -> Result<JoinHandle<()>> {
    let batch = coordinator
        .preload_all(deck.audio_files())
        .context("deck contains an empty track reference")?;

    Ok(tokio::spawn(async move {
        let report = batch.await;
        for reference in report.failed() {
            warn!(%reference, "track unavailable, its slide will be silent");
        }
        info!(
            ready = report.ready_count(),
            total = report.outcomes.len(),
            "startup preload finished"
        );
    }))
}
