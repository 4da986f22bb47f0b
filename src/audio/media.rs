//! The seam between the coordinator and a playback subsystem.
//!
//! A backend hands out one `MediaElement` per track reference. Elements start
//! loading as soon as they are opened and publish their progress through a
//! `watch` channel so waiters are woken by the load itself, not by polling.

use futures::future::BoxFuture;
use tokio::sync::watch;

use super::types::{LoadState, MediaOptions, StartOutcome, TrackRef};
use crate::error::PlaybackError;

pub trait MediaBackend: Send + Sync {
    /// Bind `reference` to a new element and begin loading it in the background.
    fn open(&self, reference: &TrackRef, options: MediaOptions) -> Box<dyn MediaElement>;
}

pub trait MediaElement: Send {
    /// Subscribe to load progress.
    fn load_state(&self) -> watch::Receiver<LoadState>;

    /// Start from position zero.
    ///
    /// The instruction is issued before this returns; the future only reports
    /// how the backend handled it.
    fn start(&mut self) -> BoxFuture<'static, Result<StartOutcome, PlaybackError>>;

    /// Pause and rewind to the start.
    fn stop(&mut self);

    /// Release the underlying resource. Calling it twice is a no-op.
    fn release(&mut self);
}
