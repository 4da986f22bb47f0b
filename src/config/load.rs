use std::{env, path::PathBuf};

use super::schema::Settings;

/// Layering: `SERENATA__SECTION__KEY` variables override the TOML file, which
/// overrides the defaults in `schema.rs`. A missing file is not an error.
impl Settings {
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("SERENATA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Reject values the audio coordinator and the slide timer cannot run with.
    ///
    /// The error names the offending key so the startup warning is actionable.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.audio.volume) {
            return Err(format!(
                "audio.volume must be within 0.0..=1.0 (got {})",
                self.audio.volume
            ));
        }
        if self.audio.preload_timeout_ms == 0 {
            return Err("audio.preload_timeout_ms must be >= 1".to_string());
        }
        if self.presentation.advance_interval_ms == 0 {
            return Err("presentation.advance_interval_ms must be >= 1".to_string());
        }
        Ok(())
    }
}

/// `SERENATA_CONFIG_PATH` wins over the per-user location.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("SERENATA_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Per-user config file: `serenata/config.toml` under `$XDG_CONFIG_HOME`,
/// or under `~/.config` without it. `None` when neither variable is set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("serenata").join("config.toml"))
}
