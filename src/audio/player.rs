use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

use super::media::{MediaBackend, MediaElement};
use super::thread::{AudioCmd, spawn_audio_thread};
use super::types::{LoadState, MediaOptions, StartOutcome, TrackRef};
use crate::error::PlaybackError;

/// `rodio`-backed media backend.
///
/// A dedicated thread owns the output stream and every sink; elements talk
/// to it over a channel, so instructions are applied in the order issued.
pub struct RodioBackend {
    tx: Sender<AudioCmd>,
    media_root: PathBuf,
    next_id: AtomicU64,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl RodioBackend {
    /// Spawn the audio thread. References resolve against `media_root`.
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let join = spawn_audio_thread(tx.clone(), rx);
        Self {
            tx,
            media_root: media_root.into(),
            next_id: AtomicU64::new(1),
            join: Mutex::new(Some(join)),
        }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// Fade out what is playing, then stop the audio thread and wait for it.
    pub fn quit_softly(&self, fade_out: Duration) {
        let _ = self.tx.send(AudioCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        let handle = self
            .join
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(h) = handle {
            let _ = h.join();
        }
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.quit_softly(Duration::ZERO);
    }
}

impl MediaBackend for RodioBackend {
    fn open(&self, reference: &TrackRef, options: MediaOptions) -> Box<dyn MediaElement> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (state_tx, state_rx) = watch::channel(LoadState::Loading);
        let path = resolve_media_path(&self.media_root, reference.as_str());
        debug!(%reference, path = %path.display(), "opening track");

        // On failure the command, and with it the state sender, is dropped;
        // waiters then see the load fail.
        if self
            .tx
            .send(AudioCmd::Load {
                id,
                reference: reference.to_string(),
                path,
                options,
                state: state_tx,
            })
            .is_err()
        {
            warn!(%reference, "audio thread is not running");
        }

        Box::new(RodioElement {
            id,
            tx: self.tx.clone(),
            state: state_rx,
            released: false,
        })
    }
}

struct RodioElement {
    id: u64,
    tx: Sender<AudioCmd>,
    state: watch::Receiver<LoadState>,
    released: bool,
}

impl MediaElement for RodioElement {
    fn load_state(&self) -> watch::Receiver<LoadState> {
        self.state.clone()
    }

    fn start(&mut self) -> BoxFuture<'static, Result<StartOutcome, PlaybackError>> {
        if self.released {
            return future::ready(Err(PlaybackError::Released)).boxed();
        }
        let (reply, rx) = oneshot::channel();
        if self.tx.send(AudioCmd::Start { id: self.id, reply }).is_err() {
            return future::ready(Err(PlaybackError::BackendGone)).boxed();
        }
        async move { rx.await.unwrap_or(Err(PlaybackError::BackendGone)) }.boxed()
    }

    fn stop(&mut self) {
        if !self.released {
            let _ = self.tx.send(AudioCmd::Stop { id: self.id });
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            let _ = self.tx.send(AudioCmd::Release { id: self.id });
        }
    }
}

/// Map a track reference onto a file.
///
/// Web-style references such as `/songs/a.mp3` are taken relative to
/// `media_root` unless they name an existing absolute path.
pub fn resolve_media_path(media_root: &Path, reference: &str) -> PathBuf {
    let as_path = Path::new(reference);
    if as_path.is_absolute() && as_path.exists() {
        return as_path.to_path_buf();
    }
    media_root.join(reference.trim_start_matches('/'))
}
