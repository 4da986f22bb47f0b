use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::audio::{CoordinatorSettings, MediaOptions, PlayPolicy};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/serenata/config.toml` or `~/.config/serenata/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `SERENATA__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub presentation: PresentationSettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Playback volume, `0.0..=1.0`.
    pub volume: f32,
    /// Repeat each track until another one replaces it.
    pub looping: bool,
    /// How long a preload waits for a track before giving up on it (milliseconds).
    pub preload_timeout_ms: u64,
    pub play_policy: PlayPolicySetting,
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
    /// Directory track references resolve against.
    /// Defaults to the directory of the deck file.
    pub media_root: Option<PathBuf>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: 0.7,
            looping: true,
            preload_timeout_ms: 3000,
            play_policy: PlayPolicySetting::Immediate,
            quit_fade_out_ms: 500,
            media_root: None,
        }
    }
}

impl AudioSettings {
    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            options: MediaOptions {
                volume: self.volume,
                looping: self.looping,
            },
            preload_timeout: Duration::from_millis(self.preload_timeout_ms),
            policy: self.play_policy.into(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayPolicySetting {
    #[serde(alias = "now", alias = "eager")]
    Immediate,
    #[serde(
        alias = "wait_for_ready",
        alias = "waitforready",
        alias = "wait"
    )]
    WaitForReady,
}

impl From<PlayPolicySetting> for PlayPolicy {
    fn from(value: PlayPolicySetting) -> Self {
        match value {
            PlayPolicySetting::Immediate => PlayPolicy::Immediate,
            PlayPolicySetting::WaitForReady => PlayPolicy::WaitForReady,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PresentationSettings {
    /// Whether slides advance on their own at startup.
    pub auto_advance: bool,
    /// Time each slide stays up while auto-advancing (milliseconds).
    pub advance_interval_ms: u64,
    /// Delay after audio is ready before the first track is cued (milliseconds).
    pub autoplay_delay_ms: u64,
    /// How long a slide change is shown as "in transition" (milliseconds).
    pub transition_ms: u64,
}

impl Default for PresentationSettings {
    fn default() -> Self {
        Self {
            auto_advance: true,
            advance_interval_ms: 8000,
            autoplay_delay_ms: 1000,
            transition_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Text rendered in the header box when the deck has no title.
    pub header_text: String,
    /// Show the slide's image path under its description.
    pub show_image_path: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ serenata ~ ".to_string(),
            show_image_path: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log file. Defaults to `serenata.log` in the temp directory.
    pub file: Option<PathBuf>,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: None,
            filter: "serenata=info".to_string(),
        }
    }
}

impl LoggingSettings {
    pub fn file_path(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("serenata.log"))
    }
}
