//! The audio playback coordinator.
//!
//! Owns one `PlaybackHandle` per track reference, preloads batches of them
//! and switches what is audible with at most one track playing at a time.
//!
//! Every operation does its bookkeeping synchronously, under the registry
//! lock, at call time. What remains (waiting for a load, learning how the
//! backend handled a start) is returned as a `'static` future the caller may
//! await or spawn. Call order therefore equals effect order even when the
//! returned futures are never awaited.
//!
//! Media failures are absorbed here: they come back as outcomes and
//! `AudioEvent`s, never as errors.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt, Shared};
use tokio::sync::{broadcast, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::media::{MediaBackend, MediaElement};
use super::types::{
    AudioEvent, AudioStatus, LoadState, MediaOptions, PendingStart, PlayOutcome, PlayPolicy,
    PreloadOutcome, PreloadReport, StartOutcome, TrackRef,
};
use crate::error::{CoordinatorError, PlaybackError};

const EVENT_CAPACITY: usize = 64;

type Settlement = Shared<BoxFuture<'static, PreloadOutcome>>;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CoordinatorSettings {
    /// Volume and looping applied to every handle.
    pub options: MediaOptions,
    /// Upper bound on how long a preload waits for its resource.
    pub preload_timeout: Duration,
    pub policy: PlayPolicy,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            options: MediaOptions::default(),
            preload_timeout: Duration::from_millis(3000),
            policy: PlayPolicy::Immediate,
        }
    }
}

/// One media resource bound to a backend element.
///
/// Dropping the handle releases the element.
struct PlaybackHandle {
    element: Box<dyn MediaElement>,
    /// Resolves once the first load settles or the preload timeout elapses.
    /// Shared so concurrent preloads coalesce into one resolution.
    settlement: Settlement,
    ready: bool,
    playing: bool,
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.element.release();
    }
}

#[derive(Default)]
struct Registry {
    handles: HashMap<TrackRef, PlaybackHandle>,
    /// Key of the handle most recently told to play.
    active: Option<TrackRef>,
    /// Bumped by every `play` and `stop_all`; a pending start whose ticket is
    /// stale must not start.
    generation: u64,
    batches_in_flight: usize,
    torn_down: bool,
}

struct Inner {
    backend: Arc<dyn MediaBackend>,
    settings: CoordinatorSettings,
    registry: Mutex<Registry>,
    status: watch::Sender<AudioStatus>,
    events: broadcast::Sender<AudioEvent>,
}

/// Cheaply cloneable handle to a shared coordinator.
///
/// The registry is torn down when `teardown` is called or when the last
/// clone is dropped. Operations that create handles must run inside a tokio
/// runtime.
#[derive(Clone)]
pub struct AudioCoordinator {
    inner: Arc<Inner>,
}

impl AudioCoordinator {
    pub fn new(backend: Arc<dyn MediaBackend>, settings: CoordinatorSettings) -> Self {
        let (status, _) = watch::channel(AudioStatus::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                backend,
                settings,
                registry: Mutex::new(Registry::default()),
                status,
                events,
            }),
        }
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.inner.settings
    }

    /// Make sure `reference` is loading and wait, bounded by the preload
    /// timeout, for it to become playable.
    ///
    /// The returned future never fails: a broken or slow resource resolves
    /// as `Failed` or `TimedOut`.
    pub fn preload(
        &self,
        reference: &str,
    ) -> Result<BoxFuture<'static, PreloadOutcome>, CoordinatorError> {
        let reference = TrackRef::new(reference)?;
        Ok(self.preload_ref(&reference))
    }

    /// Preload every reference concurrently.
    ///
    /// All references are validated before anything is touched. `loading`
    /// reads true from this call until every batch in flight has settled.
    pub fn preload_all<I, S>(
        &self,
        references: I,
    ) -> Result<BoxFuture<'static, PreloadReport>, CoordinatorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let references = references
            .into_iter()
            .map(|r| TrackRef::new(r.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        info!(count = references.len(), "preloading tracks");
        let guard = BatchGuard::begin(&self.inner);
        let pending: Vec<_> = references
            .into_iter()
            .map(|reference| {
                self.preload_ref(&reference)
                    .map(move |outcome| (reference, outcome))
            })
            .collect();

        Ok(async move {
            let outcomes = future::join_all(pending).await;
            guard.complete();
            let report = PreloadReport { outcomes };
            info!(
                ready = report.ready_count(),
                total = report.outcomes.len(),
                "preload batch settled"
            );
            report
        }
        .boxed())
    }

    fn preload_ref(&self, reference: &TrackRef) -> BoxFuture<'static, PreloadOutcome> {
        let mut registry = self.inner.lock();
        if registry.torn_down {
            debug!(%reference, "preload after teardown ignored");
            return future::ready(PreloadOutcome::Inactive).boxed();
        }
        let settlement = self
            .inner
            .ensure_handle(&mut registry, reference)
            .settlement
            .clone();
        settlement.boxed()
    }

    /// Make `reference` the one audible track, restarting it from the top.
    ///
    /// Whatever was playing is stopped before this returns. The returned
    /// future reports how the backend handled the start; a refusal is
    /// `Blocked`, and the next `play` simply tries again.
    pub fn play(&self, reference: &str) -> Result<BoxFuture<'static, PlayOutcome>, CoordinatorError> {
        let reference = TrackRef::new(reference)?;
        let inner = &self.inner;

        let mut registry = inner.lock();
        if registry.torn_down {
            debug!(%reference, "play after teardown ignored");
            return Ok(future::ready(PlayOutcome::Inactive).boxed());
        }

        inner.stop_active(&mut registry);
        registry.generation += 1;
        let ticket = registry.generation;
        registry.active = Some(reference.clone());

        let handle = inner.ensure_handle(&mut registry, &reference);
        match inner.settings.policy {
            PlayPolicy::Immediate => {
                let start = handle.element.start();
                handle.playing = true;
                drop(registry);
                debug!(%reference, "play issued");
                Ok(finish_start(Arc::downgrade(inner), reference, ticket, start).boxed())
            }
            PlayPolicy::WaitForReady => {
                let settlement = handle.settlement.clone();
                drop(registry);
                let weak = Arc::downgrade(inner);
                Ok(async move {
                    settlement.await;
                    let Some(inner) = weak.upgrade() else {
                        return PlayOutcome::Inactive;
                    };
                    let start = {
                        let mut registry = inner.lock();
                        if registry.torn_down {
                            return PlayOutcome::Inactive;
                        }
                        if registry.generation != ticket {
                            debug!(%reference, "play superseded while waiting for load");
                            return PlayOutcome::Superseded;
                        }
                        let Some(handle) = registry.handles.get_mut(&reference) else {
                            return PlayOutcome::Inactive;
                        };
                        handle.playing = true;
                        handle.element.start()
                    };
                    drop(inner);
                    finish_start(weak, reference, ticket, start).await
                }
                .boxed())
            }
        }
    }

    /// Stop everything that is playing and forget the active track.
    pub fn stop_all(&self) {
        let inner = &self.inner;
        let mut registry = inner.lock();
        registry.generation += 1;
        registry.active = None;
        for (reference, handle) in registry.handles.iter_mut() {
            if handle.playing {
                handle.element.stop();
                handle.playing = false;
                inner.emit(AudioEvent::Stopped {
                    reference: reference.clone(),
                });
            }
        }
    }

    /// Stop and release every handle. Later calls become no-ops.
    pub fn teardown(&self) {
        self.inner.teardown();
    }

    pub fn active(&self) -> Option<TrackRef> {
        self.inner.lock().active.clone()
    }

    pub fn is_playing(&self, reference: &str) -> bool {
        self.inner
            .lock()
            .handles
            .get(reference)
            .is_some_and(|h| h.playing)
    }

    /// References currently in the playing state.
    pub fn playing(&self) -> Vec<TrackRef> {
        self.inner
            .lock()
            .handles
            .iter()
            .filter(|(_, h)| h.playing)
            .map(|(r, _)| r.clone())
            .collect()
    }

    pub fn is_ready(&self, reference: &str) -> bool {
        self.inner
            .lock()
            .handles
            .get(reference)
            .is_some_and(|h| h.ready)
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.inner.lock().handles.contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self) -> AudioStatus {
        *self.inner.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<AudioStatus> {
        self.inner.status.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<AudioEvent> {
        self.inner.events.subscribe()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A start was refused: the track is no longer audible and a later
    /// `play` tries again.
    fn start_failed(&self, reference: TrackRef, ticket: u64, err: PlaybackError) {
        warn!(%reference, error = %err, "playback did not start");
        {
            let mut registry = self.lock();
            if registry.generation == ticket {
                if let Some(handle) = registry.handles.get_mut(&reference) {
                    handle.playing = false;
                }
            }
        }
        self.emit(AudioEvent::PlayBlocked {
            reference,
            reason: err.to_string(),
        });
    }

    fn emit(&self, event: AudioEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn ensure_handle<'a>(
        self: &Arc<Self>,
        registry: &'a mut Registry,
        reference: &TrackRef,
    ) -> &'a mut PlaybackHandle {
        registry
            .handles
            .entry(reference.clone())
            .or_insert_with(|| self.open_handle(reference))
    }

    fn open_handle(self: &Arc<Self>, reference: &TrackRef) -> PlaybackHandle {
        let element = self.backend.open(reference, self.settings.options);
        let (outcome_tx, outcome_rx) = oneshot::channel();
        tokio::spawn(settle_load(
            Arc::downgrade(self),
            reference.clone(),
            element.load_state(),
            self.settings.preload_timeout,
            outcome_tx,
        ));
        let settlement = outcome_rx
            .map(|outcome| outcome.unwrap_or(PreloadOutcome::Failed))
            .boxed()
            .shared();

        debug!(%reference, "media element opened");
        self.emit(AudioEvent::LoadStarted {
            reference: reference.clone(),
        });

        PlaybackHandle {
            element,
            settlement,
            ready: false,
            playing: false,
        }
    }

    fn stop_active(&self, registry: &mut Registry) {
        let Some(active) = registry.active.take() else {
            return;
        };
        if let Some(handle) = registry.handles.get_mut(&active) {
            if handle.playing {
                handle.element.stop();
                handle.playing = false;
                self.emit(AudioEvent::Stopped { reference: active });
            }
        }
    }

    fn record_settlement(&self, reference: &TrackRef, state: Option<&LoadState>, elapsed: Duration) {
        {
            let mut registry = self.lock();
            let Some(handle) = registry.handles.get_mut(reference) else {
                return;
            };
            // A bounded wait that elapsed counts as ready: playback may begin
            // and catch up.
            if !matches!(state, Some(LoadState::Failed(_))) {
                handle.ready = true;
            }
        }

        match state {
            Some(LoadState::Ready) => {
                debug!(%reference, ?elapsed, "track ready");
                self.emit(AudioEvent::Loaded {
                    reference: reference.clone(),
                    elapsed,
                });
            }
            Some(LoadState::Failed(reason)) => {
                warn!(%reference, %reason, "track failed to load");
                self.emit(AudioEvent::LoadFailed {
                    reference: reference.clone(),
                    reason: reason.clone(),
                });
            }
            Some(LoadState::Loading) | None => {
                warn!(%reference, waited = ?elapsed, "track still loading, no longer waiting");
                self.emit(AudioEvent::LoadTimedOut {
                    reference: reference.clone(),
                });
            }
        }
    }

    fn record_late_settlement(&self, reference: &TrackRef, state: &LoadState, elapsed: Duration) {
        if !self.lock().handles.contains_key(reference) {
            return;
        }
        match state {
            LoadState::Ready => {
                debug!(%reference, ?elapsed, "track ready after timeout");
                self.emit(AudioEvent::Loaded {
                    reference: reference.clone(),
                    elapsed,
                });
            }
            LoadState::Failed(reason) => {
                warn!(%reference, %reason, "track failed to load after timeout");
                self.emit(AudioEvent::LoadFailed {
                    reference: reference.clone(),
                    reason: reason.clone(),
                });
            }
            LoadState::Loading => {}
        }
    }

    fn teardown(&self) {
        let handles = {
            let mut registry = self.lock();
            if registry.torn_down {
                return;
            }
            registry.torn_down = true;
            registry.generation += 1;
            registry.active = None;
            std::mem::take(&mut registry.handles)
        };

        let released = handles.len();
        for (_, mut handle) in handles {
            if handle.playing {
                handle.element.stop();
                handle.playing = false;
            }
        }
        info!(released, "audio coordinator torn down");
        self.emit(AudioEvent::TornDown { released });
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Keeps `AudioStatus::loading` raised while a batch is in flight, including
/// when the batch future is dropped before it finishes.
struct BatchGuard {
    inner: Weak<Inner>,
}

impl BatchGuard {
    fn begin(inner: &Arc<Inner>) -> Self {
        inner.lock().batches_in_flight += 1;
        inner.status.send_modify(|s| s.loading = true);
        Self {
            inner: Arc::downgrade(inner),
        }
    }

    fn complete(self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.status.send_modify(|s| s.ready = true);
        }
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let idle = {
            let mut registry = inner.lock();
            registry.batches_in_flight = registry.batches_in_flight.saturating_sub(1);
            registry.batches_in_flight == 0
        };
        if idle {
            inner.status.send_modify(|s| s.loading = false);
        }
    }
}

/// Race the element's load against the preload timeout and publish the
/// result. A load still pending at the timeout keeps being watched so a late
/// arrival is still reported.
async fn settle_load(
    inner: Weak<Inner>,
    reference: TrackRef,
    mut load_state: watch::Receiver<LoadState>,
    timeout: Duration,
    outcome_tx: oneshot::Sender<PreloadOutcome>,
) {
    let started = Instant::now();
    let first = tokio::time::timeout(timeout, settled_state(&mut load_state))
        .await
        .ok();

    let outcome = match &first {
        Some(LoadState::Ready) => PreloadOutcome::Ready,
        Some(LoadState::Failed(_)) => PreloadOutcome::Failed,
        Some(LoadState::Loading) | None => PreloadOutcome::TimedOut,
    };
    if let Some(inner) = inner.upgrade() {
        inner.record_settlement(&reference, first.as_ref(), started.elapsed());
    }
    let _ = outcome_tx.send(outcome);

    if first.is_none() {
        let late = settled_state(&mut load_state).await;
        if let Some(inner) = inner.upgrade() {
            inner.record_late_settlement(&reference, &late, started.elapsed());
        }
    }
}

async fn settled_state(load_state: &mut watch::Receiver<LoadState>) -> LoadState {
    match load_state.wait_for(LoadState::is_settled).await {
        Ok(state) => (*state).clone(),
        Err(_) => LoadState::Failed("media element closed".to_string()),
    }
}

async fn finish_start(
    inner: Weak<Inner>,
    reference: TrackRef,
    ticket: u64,
    start: BoxFuture<'static, Result<StartOutcome, PlaybackError>>,
) -> PlayOutcome {
    let result = start.await;
    let Some(strong) = inner.upgrade() else {
        return PlayOutcome::Inactive;
    };

    match result {
        Ok(StartOutcome::Playing) => {
            debug!(%reference, "playback started");
            strong.emit(AudioEvent::PlayStarted { reference });
            PlayOutcome::Started
        }
        Ok(StartOutcome::Deferred(pending)) => {
            debug!(%reference, "playback deferred until loaded");
            strong.emit(AudioEvent::PlayDeferred {
                reference: reference.clone(),
            });
            tokio::spawn(finish_deferred(inner, reference, ticket, pending));
            PlayOutcome::Deferred
        }
        Err(err) => {
            strong.start_failed(reference, ticket, err);
            PlayOutcome::Blocked
        }
    }
}

/// Report how a deferred start went once the backend carried it out.
async fn finish_deferred(
    inner: Weak<Inner>,
    reference: TrackRef,
    ticket: u64,
    pending: PendingStart,
) {
    let result = pending.await;
    let Some(inner) = inner.upgrade() else {
        return;
    };
    {
        let registry = inner.lock();
        if registry.torn_down || registry.generation != ticket {
            debug!(%reference, "deferred start outlived its play");
            return;
        }
    }

    match result {
        Ok(()) => {
            debug!(%reference, "deferred playback started");
            inner.emit(AudioEvent::PlayStarted { reference });
        }
        Err(PlaybackError::Cancelled) => {}
        Err(err) => inner.start_failed(reference, ticket, err),
    }
}
