//! Terminal front end: argument parsing, startup, the event loop and
//! shutdown.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::{AudioCoordinator, RodioBackend};
use crate::deck::Deck;

mod event_loop;
mod input;
mod logging;
mod settings;
mod startup;


/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "serenata")]
#[command(about = "A terminal slideshow where every slide has its own song")]
#[command(version)]
pub struct Args {
    /// Deck file (TOML) with the slides and their tracks
    #[arg(env = "SERENATA_DECK")]
    pub deck: PathBuf,

    /// Directory track references resolve against
    #[arg(short, long, env = "SERENATA_MEDIA_ROOT")]
    pub media_root: Option<PathBuf>,
}

pub async fn run(args: Args) -> Result<()> {
    let (settings, settings_warning) = settings::load_settings();
    let log_path = logging::init(&settings.logging)?;
    if let Some(msg) = settings_warning {
        warn!("{msg}");
    }
    info!(log = %log_path.display(), deck = %args.deck.display(), "starting");

    let deck = Deck::load(&args.deck)
        .with_context(|| format!("failed to load deck {}", args.deck.display()))?;

    let media_root = startup::media_root(args.media_root.as_deref(), &settings, &args.deck);
    info!(media_root = %media_root.display(), "resolving tracks");
    let backend = Arc::new(RodioBackend::new(media_root));
    let coordinator =
        AudioCoordinator::new(backend.clone(), settings.audio.coordinator_settings());
    let preload = startup::spawn_preload(&coordinator, &deck)?;

    let mut app = App::new(
        deck,
        settings.presentation.auto_advance,
        Duration::from_millis(settings.presentation.transition_ms),
    );

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(terminal_backend)?;

    let run_result = event_loop::run(&mut terminal, &settings, &mut app, &coordinator).await;

    // Fade out first; tearing the coordinator down would cut the sound.
    let fade_out = Duration::from_millis(settings.audio.quit_fade_out_ms);
    let quitting = backend.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || quitting.quit_softly(fade_out)).await {
        warn!(error = %e, "audio fade-out did not finish");
    }
    coordinator.teardown();
    preload.abort();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("bye");
    run_result
}
