//! Utilities for turning track files into `rodio` sinks.
//!
//! Tracks are read fully into memory once, so every restart decodes from the
//! in-memory copy and begins at position zero.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use rodio::{Decoder, OutputStream, Sink};

use super::types::MediaOptions;

pub(super) type TrackData = Arc<[u8]>;

/// Read `path` into memory and check that it decodes.
pub(super) fn load_track(path: &Path) -> Result<TrackData, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let data: TrackData = Arc::from(bytes);
    Decoder::new(Cursor::new(data.clone())).map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(data)
}

/// Create a playing `Sink` for `data`, starting at the top.
pub(super) fn create_sink(
    stream: &OutputStream,
    data: &TrackData,
    options: MediaOptions,
) -> Result<Sink, String> {
    let cursor = Cursor::new(data.clone());
    let sink = Sink::connect_new(stream.mixer());
    if options.looping {
        sink.append(Decoder::new_looped(cursor).map_err(|e| e.to_string())?);
    } else {
        sink.append(Decoder::new(cursor).map_err(|e| e.to_string())?);
    }
    sink.set_volume(options.volume);
    sink.play();
    Ok(sink)
}

/// Ramp `sink` down to silence over roughly `fade_out_ms`.
pub(super) fn fade_out_sink(sink: &Sink, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    let start = sink.volume();
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(start * (1.0 - t));
        std::thread::sleep(std::time::Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}
