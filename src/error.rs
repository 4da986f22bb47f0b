//! Error types shared across the crate.
//!
//! Media failures never escape the coordinator as errors; they are reported
//! as outcomes and events instead. The only error a coordinator operation
//! returns is a rejected precondition.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned synchronously by coordinator operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// A track reference was empty or whitespace-only.
    #[error("track reference must not be empty")]
    EmptyReference,
}

/// Failures reported by a media backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// No audio output could be opened. Retried on the next start.
    #[error("audio output unavailable: {0}")]
    OutputUnavailable(String),

    /// The resource could not be read or decoded.
    #[error("failed to load {reference}: {reason}")]
    Load { reference: String, reason: String },

    /// A deferred start was stopped before its data arrived.
    #[error("start cancelled before the track was loaded")]
    Cancelled,

    /// The element was released before the instruction was handled.
    #[error("media element already released")]
    Released,

    /// The playback thread is gone.
    #[error("audio backend is not running")]
    BackendGone,
}

/// Errors raised while reading a deck file.
#[derive(Error, Debug)]
pub enum DeckError {
    #[error("failed to read deck {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse deck {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("deck has no reasons")]
    Empty,

    #[error("reason {index} ({title:?}) has an empty audio_file")]
    MissingAudio { index: usize, title: String },

    #[error("the finale has an empty audio_file")]
    MissingFinaleAudio,
}
