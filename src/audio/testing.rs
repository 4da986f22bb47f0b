//! In-memory media backend for exercising the coordinator without sound.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use futures::future::{self, BoxFuture, FutureExt};
use tokio::sync::watch;

use super::media::{MediaBackend, MediaElement};
use super::types::{LoadState, MediaOptions, StartOutcome, TrackRef};
use crate::error::PlaybackError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Op {
    Open(String),
    Start(String),
    Stop(String),
    Release(String),
}

#[derive(Default)]
struct State {
    ops: Vec<Op>,
    loads: HashMap<String, watch::Sender<LoadState>>,
    playing: HashSet<String>,
    blocked: bool,
    loads_start_ready: bool,
}

#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    /// Loads stay pending until `finish` is called.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every load is ready the moment it is opened.
    pub(crate) fn ready() -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().loads_start_ready = true;
        backend
    }

    pub(crate) fn finish(&self, reference: &str, outcome: LoadState) {
        let state = self.state.lock().unwrap();
        state
            .loads
            .get(reference)
            .expect("track was never opened")
            .send_replace(outcome);
    }

    /// Make every start fail as if no output device were available.
    pub(crate) fn block_output(&self, blocked: bool) {
        self.state.lock().unwrap().blocked = blocked;
    }

    pub(crate) fn is_playing(&self, reference: &str) -> bool {
        self.state.lock().unwrap().playing.contains(reference)
    }

    /// Sorted references currently producing sound.
    pub(crate) fn playing(&self) -> Vec<String> {
        let mut playing: Vec<String> = self.state.lock().unwrap().playing.iter().cloned().collect();
        playing.sort();
        playing
    }

    pub(crate) fn ops(&self) -> Vec<Op> {
        self.state.lock().unwrap().ops.clone()
    }

    pub(crate) fn opens(&self, reference: &str) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, Op::Open(r) if r == reference))
            .count()
    }

    /// Sorted references whose elements were released.
    pub(crate) fn released(&self) -> Vec<String> {
        let mut released: Vec<String> = self
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Release(r) => Some(r),
                _ => None,
            })
            .collect();
        released.sort();
        released
    }
}

impl MediaBackend for FakeBackend {
    fn open(&self, reference: &TrackRef, _options: MediaOptions) -> Box<dyn MediaElement> {
        let mut state = self.state.lock().unwrap();
        let initial = if state.loads_start_ready {
            LoadState::Ready
        } else {
            LoadState::Loading
        };
        let (tx, rx) = watch::channel(initial);
        state.loads.insert(reference.to_string(), tx);
        state.ops.push(Op::Open(reference.to_string()));
        Box::new(FakeElement {
            reference: reference.to_string(),
            load: rx,
            state: self.state.clone(),
            released: false,
        })
    }
}

struct FakeElement {
    reference: String,
    load: watch::Receiver<LoadState>,
    state: Arc<Mutex<State>>,
    released: bool,
}

impl MediaElement for FakeElement {
    fn load_state(&self) -> watch::Receiver<LoadState> {
        self.load.clone()
    }

    fn start(&mut self) -> BoxFuture<'static, Result<StartOutcome, PlaybackError>> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(Op::Start(self.reference.clone()));
        if state.blocked {
            return future::ready(Err(PlaybackError::OutputUnavailable(
                "no device".to_string(),
            )))
            .boxed();
        }
        state.playing.insert(self.reference.clone());
        if *self.load.borrow() != LoadState::Loading {
            return future::ready(Ok(StartOutcome::Playing)).boxed();
        }

        let mut load = self.load.clone();
        let shared = self.state.clone();
        let reference = self.reference.clone();
        let started = async move {
            let settled = match load.wait_for(LoadState::is_settled).await {
                Ok(settled) => settled.clone(),
                Err(_) => return Err(PlaybackError::Released),
            };
            resolve_deferred(&shared, &reference, settled)
        };
        future::ready(Ok(StartOutcome::Deferred(started.boxed()))).boxed()
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.ops.push(Op::Stop(self.reference.clone()));
        state.playing.remove(&self.reference);
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut state = self.state.lock().unwrap();
        state.ops.push(Op::Release(self.reference.clone()));
        state.playing.remove(&self.reference);
        state.loads.remove(&self.reference);
    }
}

/// Decide how a deferred start ends once the load settled.
fn resolve_deferred(
    shared: &Mutex<State>,
    reference: &str,
    settled: LoadState,
) -> Result<(), PlaybackError> {
    let mut state = shared.lock().unwrap();
    if !state.playing.contains(reference) {
        return Err(PlaybackError::Cancelled);
    }
    let refused = match settled {
        LoadState::Failed(reason) => PlaybackError::Load {
            reference: reference.to_string(),
            reason,
        },
        _ if state.blocked => PlaybackError::OutputUnavailable("no device".to_string()),
        _ => return Ok(()),
    };
    state.playing.remove(reference);
    Err(refused)
}
