use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};

use super::sink::TrackData;
use super::testing::{FakeBackend, Op};
use super::thread::{Mixer, Output, Voice};
use super::*;
use crate::error::{CoordinatorError, PlaybackError};

fn coordinator(backend: &Arc<FakeBackend>) -> AudioCoordinator {
    AudioCoordinator::new(backend.clone(), CoordinatorSettings::default())
}

fn coordinator_with(backend: &Arc<FakeBackend>, policy: PlayPolicy) -> AudioCoordinator {
    let settings = CoordinatorSettings {
        policy,
        ..CoordinatorSettings::default()
    };
    AudioCoordinator::new(backend.clone(), settings)
}

fn track(reference: &str) -> TrackRef {
    TrackRef::new(reference).unwrap()
}

/// Wait for the next `PlayStarted` or `PlayBlocked` event.
async fn next_start_report(events: &mut broadcast::Receiver<AudioEvent>) -> AudioEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("no start was reported")
            .unwrap();
        if matches!(
            event,
            AudioEvent::PlayStarted { .. } | AudioEvent::PlayBlocked { .. }
        ) {
            return event;
        }
    }
}

fn drain(events: &mut broadcast::Receiver<AudioEvent>) -> Vec<AudioEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

#[test]
fn track_ref_rejects_blank_references() {
    assert_eq!(TrackRef::new(""), Err(CoordinatorError::EmptyReference));
    assert_eq!(TrackRef::new("  \t"), Err(CoordinatorError::EmptyReference));
    assert_eq!(track("/songs/a.mp3").as_str(), "/songs/a.mp3");
    assert_ne!(track("a.mp3"), track("A.mp3"));
}

#[tokio::test]
async fn preload_then_switch_between_two_tracks() {
    let backend = Arc::new(FakeBackend::ready());
    let coord = coordinator(&backend);

    let report = coord.preload_all(["a.mp3", "b.mp3"]).unwrap().await;
    assert_eq!(report.ready_count(), 2);
    assert_eq!(
        coord.status(),
        AudioStatus {
            loading: false,
            ready: true
        }
    );
    assert!(coord.is_ready("a.mp3"));
    assert!(coord.is_ready("b.mp3"));

    assert_eq!(coord.play("a.mp3").unwrap().await, PlayOutcome::Started);
    assert_eq!(backend.playing(), vec!["a.mp3"]);

    assert_eq!(coord.play("b.mp3").unwrap().await, PlayOutcome::Started);
    assert_eq!(backend.playing(), vec!["b.mp3"]);
    assert_eq!(coord.active(), Some(track("b.mp3")));
    assert!(!coord.is_playing("a.mp3"));
    assert_eq!(coord.len(), 2);
}

#[tokio::test]
async fn rapid_plays_leave_only_the_last_one_audible() {
    let backend = Arc::new(FakeBackend::new());
    let coord = coordinator(&backend);

    let a = coord.play("a").unwrap();
    let b = coord.play("b").unwrap();
    let c = coord.play("c").unwrap();

    // Effects are applied when the call returns, before anything is awaited.
    assert_eq!(backend.playing(), vec!["c"]);
    assert_eq!(coord.playing(), vec![track("c")]);

    let outcomes = futures::future::join_all([a, b, c]).await;
    assert_eq!(outcomes, vec![PlayOutcome::Deferred; 3]);

    backend.finish("a", LoadState::Ready);
    backend.finish("b", LoadState::Ready);
    backend.finish("c", LoadState::Ready);
    tokio::task::yield_now().await;

    assert_eq!(backend.playing(), vec!["c"]);
    assert_eq!(coord.active(), Some(track("c")));
}

#[tokio::test]
async fn failed_load_resolves_preload_and_is_reported() {
    let backend = Arc::new(FakeBackend::new());
    let coord = coordinator(&backend);
    let mut events = coord.subscribe_events();

    let preload = coord.preload("missing.mp3").unwrap();
    backend.finish("missing.mp3", LoadState::Failed("404".to_string()));

    assert_eq!(preload.await, PreloadOutcome::Failed);
    assert!(!coord.is_ready("missing.mp3"));
    assert!(coord.contains("missing.mp3"));
    assert_eq!(
        drain(&mut events),
        vec![
            AudioEvent::LoadStarted {
                reference: track("missing.mp3")
            },
            AudioEvent::LoadFailed {
                reference: track("missing.mp3"),
                reason: "404".to_string()
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn slow_load_times_out_and_is_still_reported_later() {
    let backend = Arc::new(FakeBackend::new());
    let coord = coordinator(&backend);
    let mut events = coord.subscribe_events();

    let started = tokio::time::Instant::now();
    assert_eq!(
        coord.preload("slow.mp3").unwrap().await,
        PreloadOutcome::TimedOut
    );
    assert!(started.elapsed() >= coord.settings().preload_timeout);
    // A bounded wait that elapsed does not keep the track out of play.
    assert!(coord.is_ready("slow.mp3"));

    assert!(matches!(
        events.recv().await.unwrap(),
        AudioEvent::LoadStarted { .. }
    ));
    assert_eq!(
        events.recv().await.unwrap(),
        AudioEvent::LoadTimedOut {
            reference: track("slow.mp3")
        }
    );

    backend.finish("slow.mp3", LoadState::Ready);
    match events.recv().await.unwrap() {
        AudioEvent::Loaded { reference, .. } => assert_eq!(reference, track("slow.mp3")),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_preloads_share_one_element() {
    let backend = Arc::new(FakeBackend::new());
    let coord = coordinator(&backend);

    let first = coord.preload("a.mp3").unwrap();
    let second = coord.preload("a.mp3").unwrap();
    backend.finish("a.mp3", LoadState::Ready);

    let (first, second) = futures::join!(first, second);
    assert_eq!(first, PreloadOutcome::Ready);
    assert_eq!(second, PreloadOutcome::Ready);
    assert_eq!(backend.opens("a.mp3"), 1);
    assert_eq!(coord.len(), 1);

    // Already settled: resolves right away without a second open.
    assert_eq!(coord.preload("a.mp3").unwrap().await, PreloadOutcome::Ready);
    assert_eq!(backend.opens("a.mp3"), 1);
}

#[tokio::test(start_paused = true)]
async fn batch_settles_despite_broken_and_stalled_tracks() {
    let backend = Arc::new(FakeBackend::new());
    let coord = coordinator(&backend);

    let batch = coord
        .preload_all(["ok.mp3", "broken.mp3", "stalled.mp3"])
        .unwrap();
    assert!(coord.status().loading);
    assert!(!coord.status().ready);

    backend.finish("ok.mp3", LoadState::Ready);
    backend.finish("broken.mp3", LoadState::Failed("decode error".to_string()));

    let report = batch.await;
    assert_eq!(
        report.outcomes,
        vec![
            (track("ok.mp3"), PreloadOutcome::Ready),
            (track("broken.mp3"), PreloadOutcome::Failed),
            (track("stalled.mp3"), PreloadOutcome::TimedOut),
        ]
    );
    assert_eq!(report.failed().collect::<Vec<_>>(), vec![&track("broken.mp3")]);
    assert_eq!(
        coord.status(),
        AudioStatus {
            loading: false,
            ready: true
        }
    );
}

#[tokio::test]
async fn dropping_a_batch_lowers_loading() {
    let backend = Arc::new(FakeBackend::new());
    let coord = coordinator(&backend);

    let first = coord.preload_all(["a.mp3"]).unwrap();
    let second = coord.preload_all(["b.mp3"]).unwrap();
    drop(first);
    assert!(coord.status().loading);

    drop(second);
    assert_eq!(coord.status(), AudioStatus::default());
    // The handles themselves stay registered.
    assert_eq!(coord.len(), 2);
}

#[tokio::test]
async fn blank_reference_rejects_the_whole_batch() {
    let backend = Arc::new(FakeBackend::new());
    let coord = coordinator(&backend);

    let result = coord.preload_all(["a.mp3", " "]);
    assert!(matches!(result, Err(CoordinatorError::EmptyReference)));
    assert!(matches!(
        coord.play(""),
        Err(CoordinatorError::EmptyReference)
    ));
    assert!(matches!(
        coord.preload(""),
        Err(CoordinatorError::EmptyReference)
    ));

    assert!(coord.is_empty());
    assert!(backend.ops().is_empty());
    assert_eq!(coord.status(), AudioStatus::default());
    assert_eq!(coord.active(), None);
}

#[tokio::test]
async fn play_without_preload_matches_play_after_preload() {
    let cold = Arc::new(FakeBackend::ready());
    let coord = coordinator(&cold);
    assert_eq!(coord.play("a.mp3").unwrap().await, PlayOutcome::Started);

    let warm = Arc::new(FakeBackend::ready());
    let other = coordinator(&warm);
    other.preload("a.mp3").unwrap().await;
    assert_eq!(other.play("a.mp3").unwrap().await, PlayOutcome::Started);

    let expected = vec![Op::Open("a.mp3".into()), Op::Start("a.mp3".into())];
    assert_eq!(cold.ops(), expected);
    assert_eq!(warm.ops(), expected);
}

#[tokio::test]
async fn replaying_the_active_track_restarts_it() {
    let backend = Arc::new(FakeBackend::ready());
    let coord = coordinator(&backend);

    coord.play("a.mp3").unwrap().await;
    coord.play("a.mp3").unwrap().await;

    assert_eq!(
        backend.ops(),
        vec![
            Op::Open("a.mp3".into()),
            Op::Start("a.mp3".into()),
            Op::Stop("a.mp3".into()),
            Op::Start("a.mp3".into()),
        ]
    );
    assert_eq!(backend.playing(), vec!["a.mp3"]);
}

#[tokio::test]
async fn stop_all_silences_and_clears_active() {
    let backend = Arc::new(FakeBackend::ready());
    let coord = coordinator(&backend);
    let mut events = coord.subscribe_events();

    coord.play("a.mp3").unwrap().await;
    coord.stop_all();

    assert_eq!(coord.active(), None);
    assert!(!coord.is_playing("a.mp3"));
    assert!(backend.playing().is_empty());
    assert!(drain(&mut events).contains(&AudioEvent::Stopped {
        reference: track("a.mp3")
    }));

    // Nothing playing: a second call changes nothing.
    coord.stop_all();
    assert_eq!(backend.ops().last(), Some(&Op::Stop("a.mp3".into())));
}

#[tokio::test]
async fn blocked_start_is_retried_by_the_next_play() {
    let backend = Arc::new(FakeBackend::ready());
    let coord = coordinator(&backend);
    let mut events = coord.subscribe_events();

    backend.block_output(true);
    assert_eq!(coord.play("a.mp3").unwrap().await, PlayOutcome::Blocked);
    assert!(!coord.is_playing("a.mp3"));
    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        AudioEvent::PlayBlocked { reference, .. } if *reference == track("a.mp3")
    )));

    backend.block_output(false);
    assert_eq!(coord.play("a.mp3").unwrap().await, PlayOutcome::Started);
    assert!(coord.is_playing("a.mp3"));
    assert_eq!(backend.playing(), vec!["a.mp3"]);
}

#[tokio::test]
async fn deferred_start_reports_when_sound_begins() {
    let backend = Arc::new(FakeBackend::new());
    let coord = coordinator(&backend);
    let mut events = coord.subscribe_events();

    assert_eq!(coord.play("a.mp3").unwrap().await, PlayOutcome::Deferred);
    backend.finish("a.mp3", LoadState::Ready);

    assert_eq!(
        next_start_report(&mut events).await,
        AudioEvent::PlayStarted {
            reference: track("a.mp3")
        }
    );
    assert!(coord.is_playing("a.mp3"));
}

#[tokio::test]
async fn deferred_start_that_fails_is_blocked_and_retried() {
    let backend = Arc::new(FakeBackend::new());
    let coord = coordinator(&backend);
    let mut events = coord.subscribe_events();

    assert_eq!(coord.play("a.mp3").unwrap().await, PlayOutcome::Deferred);
    assert!(coord.is_playing("a.mp3"));

    backend.block_output(true);
    backend.finish("a.mp3", LoadState::Ready);
    assert!(matches!(
        next_start_report(&mut events).await,
        AudioEvent::PlayBlocked { reference, .. } if reference == track("a.mp3")
    ));
    assert!(!coord.is_playing("a.mp3"));
    assert!(backend.playing().is_empty());
    assert_eq!(coord.active(), Some(track("a.mp3")));

    backend.block_output(false);
    assert_eq!(coord.play("a.mp3").unwrap().await, PlayOutcome::Started);
    assert_eq!(backend.playing(), vec!["a.mp3"]);
}

#[tokio::test]
async fn deferred_start_of_a_broken_track_is_blocked() {
    let backend = Arc::new(FakeBackend::new());
    let coord = coordinator(&backend);
    let mut events = coord.subscribe_events();

    coord.play("broken.mp3").unwrap().await;
    backend.finish("broken.mp3", LoadState::Failed("decode error".to_string()));

    assert!(matches!(
        next_start_report(&mut events).await,
        AudioEvent::PlayBlocked { reference, .. } if reference == track("broken.mp3")
    ));
    assert!(coord.playing().is_empty());
}

#[tokio::test]
async fn superseded_deferred_starts_stay_quiet() {
    let backend = Arc::new(FakeBackend::new());
    let coord = coordinator(&backend);
    let mut events = coord.subscribe_events();

    coord.play("a.mp3").unwrap().await;
    coord.play("b.mp3").unwrap().await;
    backend.finish("a.mp3", LoadState::Failed("404".to_string()));
    backend.finish("b.mp3", LoadState::Ready);

    // Only the active track reports; a's cancelled start is not a block.
    assert_eq!(
        next_start_report(&mut events).await,
        AudioEvent::PlayStarted {
            reference: track("b.mp3")
        }
    );
    assert_eq!(coord.playing(), vec![track("b.mp3")]);
}

#[tokio::test]
async fn waiting_play_is_superseded_by_a_newer_one() {
    let backend = Arc::new(FakeBackend::new());
    let coord = coordinator_with(&backend, PlayPolicy::WaitForReady);

    let first = coord.play("a.mp3").unwrap();
    let second = coord.play("b.mp3").unwrap();
    backend.finish("a.mp3", LoadState::Ready);
    backend.finish("b.mp3", LoadState::Ready);

    assert_eq!(first.await, PlayOutcome::Superseded);
    assert_eq!(second.await, PlayOutcome::Started);
    assert_eq!(backend.playing(), vec!["b.mp3"]);
    assert!(!backend.ops().contains(&Op::Start("a.mp3".into())));
}

#[tokio::test]
async fn waiting_play_is_cancelled_by_stop_all() {
    let backend = Arc::new(FakeBackend::new());
    let coord = coordinator_with(&backend, PlayPolicy::WaitForReady);

    let pending = coord.play("a.mp3").unwrap();
    coord.stop_all();
    backend.finish("a.mp3", LoadState::Ready);

    assert_eq!(pending.await, PlayOutcome::Superseded);
    assert!(backend.playing().is_empty());
}

#[tokio::test]
async fn teardown_releases_everything_and_disables_the_coordinator() {
    let backend = Arc::new(FakeBackend::ready());
    let coord = coordinator(&backend);
    let mut events = coord.subscribe_events();

    coord.preload_all(["a.mp3", "b.mp3"]).unwrap().await;
    coord.play("a.mp3").unwrap().await;
    drain(&mut events);

    coord.teardown();
    assert!(coord.is_empty());
    assert_eq!(coord.active(), None);
    assert!(backend.playing().is_empty());
    assert_eq!(backend.released(), vec!["a.mp3", "b.mp3"]);
    assert_eq!(drain(&mut events), vec![AudioEvent::TornDown { released: 2 }]);

    assert_eq!(coord.play("a.mp3").unwrap().await, PlayOutcome::Inactive);
    assert_eq!(
        coord.preload("c.mp3").unwrap().await,
        PreloadOutcome::Inactive
    );
    assert_eq!(backend.opens("c.mp3"), 0);

    coord.teardown();
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn teardown_of_an_empty_registry_is_harmless() {
    let backend = Arc::new(FakeBackend::new());
    let coord = coordinator(&backend);
    let mut events = coord.subscribe_events();

    coord.teardown();
    assert_eq!(drain(&mut events), vec![AudioEvent::TornDown { released: 0 }]);
    assert!(backend.ops().is_empty());
}

#[tokio::test]
async fn dropping_the_last_clone_releases_handles() {
    let backend = Arc::new(FakeBackend::ready());
    let coord = coordinator(&backend);
    let clone = coord.clone();

    coord.play("a.mp3").unwrap().await;
    drop(coord);
    assert!(backend.released().is_empty());
    assert!(clone.is_playing("a.mp3"));

    drop(clone);
    assert_eq!(backend.released(), vec!["a.mp3"]);
    assert!(backend.playing().is_empty());
}

#[derive(Clone, Default)]
struct TestOutput {
    audible: Rc<RefCell<Vec<String>>>,
    unavailable: Rc<Cell<bool>>,
}

struct TestVoice {
    reference: String,
    audible: Rc<RefCell<Vec<String>>>,
}

impl Voice for TestVoice {
    fn halt(self, _fade_out_ms: u64) {
        self.audible.borrow_mut().retain(|r| *r != self.reference);
    }
}

impl Output for TestOutput {
    type Voice = TestVoice;

    fn voice(
        &mut self,
        reference: &str,
        _data: &TrackData,
        _options: MediaOptions,
    ) -> Result<TestVoice, PlaybackError> {
        if self.unavailable.get() {
            return Err(PlaybackError::OutputUnavailable("no device".to_string()));
        }
        self.audible.borrow_mut().push(reference.to_string());
        Ok(TestVoice {
            reference: reference.to_string(),
            audible: self.audible.clone(),
        })
    }
}

impl TestOutput {
    fn audible(&self) -> Vec<String> {
        self.audible.borrow().clone()
    }
}

fn pcm() -> TrackData {
    Arc::from(&b"pcm"[..])
}

type TestMixer = (Mixer<TestOutput>, TestOutput, Vec<watch::Receiver<LoadState>>);

/// A mixer over `TestOutput` with one slot per reference, ids from 1.
fn mixer(references: &[&str]) -> TestMixer {
    let output = TestOutput::default();
    let mut mixer = Mixer::new(output.clone());
    let mut states = Vec::new();
    for (i, reference) in references.iter().enumerate() {
        let (tx, rx) = watch::channel(LoadState::Loading);
        mixer.register(i as u64 + 1, reference.to_string(), MediaOptions::default(), tx);
        states.push(rx);
    }
    (mixer, output, states)
}

fn deferred(outcome: Result<StartOutcome, PlaybackError>) -> PendingStart {
    match outcome {
        Ok(StartOutcome::Deferred(pending)) => pending,
        other => panic!("expected a deferred start, got {other:?}"),
    }
}

#[tokio::test]
async fn mixer_runs_a_deferred_start_when_the_data_lands() {
    let (mut mixer, output, states) = mixer(&["a"]);

    let pending = deferred(mixer.start(1));
    assert!(output.audible().is_empty());

    mixer.loaded(1, Ok(pcm()));
    assert_eq!(*states[0].borrow(), LoadState::Ready);
    assert_eq!(output.audible(), vec!["a"]);
    assert_eq!(pending.await, Ok(()));

    // Loaded now: a restart plays right away.
    assert!(matches!(mixer.start(1), Ok(StartOutcome::Playing)));
    assert_eq!(output.audible(), vec!["a"]);
}

#[tokio::test]
async fn mixer_stop_cancels_a_deferred_start() {
    let (mut mixer, output, _states) = mixer(&["a", "b"]);
    mixer.loaded(2, Ok(pcm()));

    let pending = deferred(mixer.start(1));
    mixer.stop(1);
    assert!(matches!(mixer.start(2), Ok(StartOutcome::Playing)));
    mixer.loaded(1, Ok(pcm()));

    assert_eq!(output.audible(), vec!["b"]);
    assert_eq!(pending.await, Err(PlaybackError::Cancelled));
}

#[tokio::test]
async fn mixer_reports_a_deferred_start_without_output() {
    let (mut mixer, output, _states) = mixer(&["a"]);
    output.unavailable.set(true);

    let pending = deferred(mixer.start(1));
    mixer.loaded(1, Ok(pcm()));
    assert!(matches!(
        pending.await,
        Err(PlaybackError::OutputUnavailable(_))
    ));
    assert!(output.audible().is_empty());

    output.unavailable.set(false);
    assert!(matches!(mixer.start(1), Ok(StartOutcome::Playing)));
    assert_eq!(output.audible(), vec!["a"]);
}

#[tokio::test]
async fn mixer_fails_starts_of_tracks_that_did_not_load() {
    let (mut mixer, output, states) = mixer(&["a"]);

    let pending = deferred(mixer.start(1));
    mixer.loaded(1, Err("decode error".to_string()));
    assert_eq!(
        *states[0].borrow(),
        LoadState::Failed("decode error".to_string())
    );
    assert!(matches!(pending.await, Err(PlaybackError::Load { .. })));

    assert!(matches!(mixer.start(1), Err(PlaybackError::Load { .. })));
    assert!(output.audible().is_empty());
}

#[tokio::test]
async fn mixer_refuses_released_elements() {
    let (mut mixer, output, _states) = mixer(&["a"]);

    let pending = deferred(mixer.start(1));
    mixer.release(1);
    assert_eq!(pending.await, Err(PlaybackError::Released));

    // A loader finishing late is ignored.
    mixer.loaded(1, Ok(pcm()));
    assert!(matches!(mixer.start(1), Err(PlaybackError::Released)));
    assert!(output.audible().is_empty());
}

#[test]
fn mixer_quit_silences_everything() {
    let (mut mixer, output, _states) = mixer(&["a", "b"]);
    mixer.loaded(1, Ok(pcm()));
    mixer.loaded(2, Ok(pcm()));
    assert!(matches!(mixer.start(1), Ok(StartOutcome::Playing)));
    assert!(matches!(mixer.start(2), Ok(StartOutcome::Playing)));

    mixer.quit(0);
    assert!(output.audible().is_empty());
}

fn write_tone(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..800 {
        let sample = ((i as f32 * 0.2).sin() * 8000.0) as i16;
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
    path
}

async fn settled(element: &dyn MediaElement) -> LoadState {
    let mut state = element.load_state();
    let settled = tokio::time::timeout(Duration::from_secs(5), state.wait_for(LoadState::is_settled))
        .await
        .expect("load did not settle in time")
        .expect("load state sender dropped");
    (*settled).clone()
}

#[tokio::test]
async fn rodio_backend_loads_a_wav_file() {
    let dir = tempfile::tempdir().unwrap();
    write_tone(dir.path(), "tone.wav");

    let backend = RodioBackend::new(dir.path());
    let element = backend.open(&track("/tone.wav"), MediaOptions::default());
    assert_eq!(settled(element.as_ref()).await, LoadState::Ready);
}

#[tokio::test]
async fn rodio_backend_reports_missing_and_undecodable_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("noise.mp3"), b"definitely not audio").unwrap();

    let backend = RodioBackend::new(dir.path());
    let missing = backend.open(&track("missing.wav"), MediaOptions::default());
    let garbage = backend.open(&track("noise.mp3"), MediaOptions::default());

    assert!(matches!(
        settled(missing.as_ref()).await,
        LoadState::Failed(_)
    ));
    assert!(matches!(
        settled(garbage.as_ref()).await,
        LoadState::Failed(_)
    ));
}

#[tokio::test]
async fn coordinator_over_rodio_absorbs_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    write_tone(dir.path(), "tone.wav");

    let backend = Arc::new(RodioBackend::new(dir.path()));
    let coord = AudioCoordinator::new(backend, CoordinatorSettings::default());
    let report = coord
        .preload_all(["tone.wav", "missing.wav"])
        .unwrap()
        .await;

    assert_eq!(
        report.outcomes,
        vec![
            (track("tone.wav"), PreloadOutcome::Ready),
            (track("missing.wav"), PreloadOutcome::Failed),
        ]
    );
    coord.teardown();
}

#[test]
fn references_resolve_under_the_media_root() {
    let root = Path::new("/srv/serenata");
    assert_eq!(
        resolve_media_path(root, "/songs/a.mp3"),
        PathBuf::from("/srv/serenata/songs/a.mp3")
    );
    assert_eq!(
        resolve_media_path(root, "b.mp3"),
        PathBuf::from("/srv/serenata/b.mp3")
    );
}

#[test]
fn existing_absolute_paths_are_used_as_is() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let absolute = file.path().to_str().unwrap();
    assert_eq!(
        resolve_media_path(Path::new("/srv/serenata"), absolute),
        file.path()
    );
}
