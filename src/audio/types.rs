//! Audio-related small types.
//!
//! This module defines the track reference key, load states, the outcomes
//! returned by coordinator operations and the events it emits.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::error::{CoordinatorError, PlaybackError};

/// Opaque, non-empty identifier of a playable media resource.
///
/// Equality is exact string match. Cloning is cheap.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackRef(Arc<str>);

impl TrackRef {
    pub fn new(reference: &str) -> Result<Self, CoordinatorError> {
        if reference.trim().is_empty() {
            return Err(CoordinatorError::EmptyReference);
        }
        Ok(Self(Arc::from(reference)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for TrackRef {
    type Error = CoordinatorError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Borrow<str> for TrackRef {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TrackRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrackRef({:?})", &*self.0)
    }
}

/// Loading progress of one media element, published by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Still fetching or decoding.
    Loading,
    /// Enough data is buffered to play through.
    Ready,
    /// The resource could not be loaded.
    Failed(String),
}

impl LoadState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, LoadState::Loading)
    }
}

/// Per-handle playback options.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MediaOptions {
    /// Output volume as a fraction of full scale.
    pub volume: f32,
    /// Repeat until replaced.
    pub looping: bool,
}

impl Default for MediaOptions {
    fn default() -> Self {
        Self {
            volume: 0.7,
            looping: true,
        }
    }
}

/// Completion of a deferred start: `Ok` once sound actually began.
pub type PendingStart = BoxFuture<'static, Result<(), PlaybackError>>;

/// What the backend did with a start instruction.
pub enum StartOutcome {
    /// Sound is playing.
    Playing,
    /// Data is not decoded yet; playback begins as soon as it is, and the
    /// future reports whether it did.
    Deferred(PendingStart),
}

impl fmt::Debug for StartOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartOutcome::Playing => f.write_str("Playing"),
            StartOutcome::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Whether `play` waits for the handle to settle before starting it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlayPolicy {
    /// Start right away and let the backend begin when it can.
    #[default]
    Immediate,
    /// Await the handle's preload settlement first.
    WaitForReady,
}

/// How a single preload settled. Never an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PreloadOutcome {
    Ready,
    TimedOut,
    Failed,
    /// The coordinator was already torn down; nothing was loaded.
    Inactive,
}

/// How a play request settled. Never an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    /// Accepted; sound starts once the data is decoded.
    Deferred,
    /// The backend refused to start (no output, broken resource).
    Blocked,
    /// A newer `play` or `stop_all` took over before this one started.
    Superseded,
    /// The coordinator was already torn down.
    Inactive,
}

/// Result of a `preload_all` batch.
#[derive(Debug, Clone, Default)]
pub struct PreloadReport {
    pub outcomes: Vec<(TrackRef, PreloadOutcome)>,
}

impl PreloadReport {
    pub fn ready_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == PreloadOutcome::Ready)
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &TrackRef> {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == PreloadOutcome::Failed)
            .map(|(r, _)| r)
    }
}

/// Coarse status observed by the presentation layer.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct AudioStatus {
    /// A `preload_all` batch is in flight.
    pub loading: bool,
    /// At least one `preload_all` batch has completed.
    pub ready: bool,
}

/// Notifications emitted by the coordinator for observability.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    LoadStarted { reference: TrackRef },
    Loaded { reference: TrackRef, elapsed: Duration },
    LoadFailed { reference: TrackRef, reason: String },
    LoadTimedOut { reference: TrackRef },
    PlayStarted { reference: TrackRef },
    PlayDeferred { reference: TrackRef },
    PlayBlocked { reference: TrackRef, reason: String },
    Stopped { reference: TrackRef },
    TornDown { released: usize },
}
