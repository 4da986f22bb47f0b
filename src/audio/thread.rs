use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::thread::JoinHandle;

use futures::future::FutureExt;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info};

use super::sink::{TrackData, create_sink, fade_out_sink, load_track};
use super::types::{LoadState, MediaOptions, StartOutcome};
use crate::error::PlaybackError;

/// Instructions handled by the audio thread, strictly in arrival order.
pub(super) enum AudioCmd {
    /// Register element `id` and start reading `path` on a loader thread.
    Load {
        id: u64,
        reference: String,
        path: PathBuf,
        options: MediaOptions,
        state: watch::Sender<LoadState>,
    },
    /// A loader thread finished.
    Loaded {
        id: u64,
        result: Result<TrackData, String>,
    },
    /// Start from the top, or as soon as the data is decoded.
    Start {
        id: u64,
        reply: oneshot::Sender<Result<StartOutcome, PlaybackError>>,
    },
    /// Pause and rewind. Also cancels a deferred start.
    Stop { id: u64 },
    Release { id: u64 },
    /// Fade out whatever plays and exit the thread.
    Quit { fade_out_ms: u64 },
}

/// Something that turns decoded track data into sound.
pub(super) trait Output {
    type Voice: Voice;

    fn voice(
        &mut self,
        reference: &str,
        data: &TrackData,
        options: MediaOptions,
    ) -> Result<Self::Voice, PlaybackError>;
}

/// One sounding track.
pub(super) trait Voice {
    /// Silence it, ramping down over `fade_out_ms` first when non-zero.
    fn halt(self, fade_out_ms: u64);
}

impl Voice for Sink {
    fn halt(self, fade_out_ms: u64) {
        if fade_out_ms > 0 {
            fade_out_sink(&self, fade_out_ms);
        }
        self.stop();
    }
}

/// The output device, opened on the first start.
///
/// A failed open is not remembered, so the next start tries again.
#[derive(Default)]
struct DeviceOutput {
    stream: Option<OutputStream>,
}

impl DeviceOutput {
    fn stream(&mut self) -> Result<&OutputStream, PlaybackError> {
        if self.stream.is_none() {
            let mut stream = OutputStreamBuilder::open_default_stream()
                .map_err(|e| PlaybackError::OutputUnavailable(e.to_string()))?;
            // rodio logs to stderr when the stream is dropped; that would tear the TUI.
            stream.log_on_drop(false);
            info!("audio output opened");
            self.stream = Some(stream);
        }
        self.stream
            .as_ref()
            .ok_or_else(|| PlaybackError::OutputUnavailable("no output stream".to_string()))
    }
}

impl Output for DeviceOutput {
    type Voice = Sink;

    fn voice(
        &mut self,
        reference: &str,
        data: &TrackData,
        options: MediaOptions,
    ) -> Result<Sink, PlaybackError> {
        let stream = self.stream()?;
        create_sink(stream, data, options).map_err(|reason| PlaybackError::Load {
            reference: reference.to_string(),
            reason,
        })
    }
}

struct Slot<V> {
    reference: String,
    options: MediaOptions,
    state: watch::Sender<LoadState>,
    data: Option<TrackData>,
    voice: Option<V>,
    /// Caller of a start that is waiting for the data.
    pending: Option<oneshot::Sender<Result<(), PlaybackError>>>,
}

impl<V: Voice> Slot<V> {
    fn silence(&mut self) {
        if let Some(voice) = self.voice.take() {
            voice.halt(0);
        }
    }

    fn answer_pending(&mut self, result: Result<(), PlaybackError>) {
        if let Some(pending) = self.pending.take() {
            let _ = pending.send(result);
        }
    }
}

/// Per-element playback state of the audio thread.
///
/// Every transition is synchronous; only loading happens elsewhere, and its
/// result comes back through `loaded`.
pub(super) struct Mixer<O: Output> {
    output: O,
    slots: HashMap<u64, Slot<O::Voice>>,
}

impl<O: Output> Mixer<O> {
    pub(super) fn new(output: O) -> Self {
        Self {
            output,
            slots: HashMap::new(),
        }
    }

    pub(super) fn register(
        &mut self,
        id: u64,
        reference: String,
        options: MediaOptions,
        state: watch::Sender<LoadState>,
    ) {
        self.slots.insert(
            id,
            Slot {
                reference,
                options,
                state,
                data: None,
                voice: None,
                pending: None,
            },
        );
    }

    pub(super) fn loaded(&mut self, id: u64, result: Result<TrackData, String>) {
        // Released while the loader was still reading.
        let Some(slot) = self.slots.get_mut(&id) else {
            return;
        };
        match result {
            Ok(data) => {
                slot.data = Some(data);
                slot.state.send_replace(LoadState::Ready);
                if slot.pending.is_some() {
                    let result = start_voice(&mut self.output, slot);
                    if let Err(e) = &result {
                        debug!(reference = %slot.reference, error = %e, "deferred start failed");
                    }
                    slot.answer_pending(result);
                }
            }
            Err(reason) => {
                let error = PlaybackError::Load {
                    reference: slot.reference.clone(),
                    reason: reason.clone(),
                };
                slot.answer_pending(Err(error));
                slot.state.send_replace(LoadState::Failed(reason));
            }
        }
    }

    pub(super) fn start(&mut self, id: u64) -> Result<StartOutcome, PlaybackError> {
        let Some(slot) = self.slots.get_mut(&id) else {
            return Err(PlaybackError::Released);
        };
        slot.silence();
        slot.answer_pending(Err(PlaybackError::Cancelled));

        let state = slot.state.borrow().clone();
        match state {
            LoadState::Ready => {
                start_voice(&mut self.output, slot)?;
                Ok(StartOutcome::Playing)
            }
            LoadState::Loading => {
                let (tx, rx) = oneshot::channel();
                slot.pending = Some(tx);
                let started = async move { rx.await.unwrap_or(Err(PlaybackError::BackendGone)) };
                Ok(StartOutcome::Deferred(started.boxed()))
            }
            LoadState::Failed(reason) => Err(PlaybackError::Load {
                reference: slot.reference.clone(),
                reason,
            }),
        }
    }

    pub(super) fn stop(&mut self, id: u64) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.answer_pending(Err(PlaybackError::Cancelled));
            slot.silence();
        }
    }

    pub(super) fn release(&mut self, id: u64) {
        if let Some(mut slot) = self.slots.remove(&id) {
            slot.answer_pending(Err(PlaybackError::Released));
            slot.silence();
            debug!(reference = %slot.reference, "released");
        }
    }

    /// Fade out every sounding track.
    pub(super) fn quit(&mut self, fade_out_ms: u64) {
        for slot in self.slots.values_mut() {
            if let Some(voice) = slot.voice.take() {
                voice.halt(fade_out_ms);
            }
        }
    }
}

fn start_voice<O: Output>(output: &mut O, slot: &mut Slot<O::Voice>) -> Result<(), PlaybackError> {
    let Some(data) = slot.data.as_ref() else {
        return Err(PlaybackError::Load {
            reference: slot.reference.clone(),
            reason: "not loaded".to_string(),
        });
    };
    let voice = output.voice(&slot.reference, data, slot.options)?;
    slot.voice = Some(voice);
    Ok(())
}

pub(super) fn spawn_audio_thread(tx: Sender<AudioCmd>, rx: Receiver<AudioCmd>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut mixer = Mixer::new(DeviceOutput::default());

        while let Ok(cmd) = rx.recv() {
            match cmd {
                AudioCmd::Load {
                    id,
                    reference,
                    path,
                    options,
                    state,
                } => {
                    let loader_tx = tx.clone();
                    let loader_path = path.clone();
                    thread::spawn(move || {
                        let result = load_track(&loader_path);
                        let _ = loader_tx.send(AudioCmd::Loaded { id, result });
                    });
                    debug!(%reference, path = %path.display(), "load queued");
                    mixer.register(id, reference, options, state);
                }
                AudioCmd::Loaded { id, result } => mixer.loaded(id, result),
                AudioCmd::Start { id, reply } => {
                    let _ = reply.send(mixer.start(id));
                }
                AudioCmd::Stop { id } => mixer.stop(id),
                AudioCmd::Release { id } => mixer.release(id),
                AudioCmd::Quit { fade_out_ms } => {
                    mixer.quit(fade_out_ms);
                    break;
                }
            }
        }
        debug!("audio thread exiting");
    })
}
